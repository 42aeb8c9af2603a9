//! Road metadata and the speed model derived from it.

use rn_core::RoadId;

use crate::records::RoadInfoRecord;

/// Which traveller groups a road is closed to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Access {
    pub no_cars:        bool,
    pub no_pedestrians: bool,
    pub no_cyclists:    bool,
}

/// Metadata shared by every segment of one road.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadInfo {
    pub id:          RoadId,
    pub kind:        i32,
    pub label:       String,
    pub city:        String,
    pub one_way:     bool,
    pub speed_class: i32,
    pub road_class:  i32,
    pub access:      Access,
}

impl RoadInfo {
    /// Build from a record, substituting `placeholder` for the `"-"` label.
    pub fn from_record(rec: &RoadInfoRecord, placeholder: &str) -> Self {
        let label = if rec.label == "-" { placeholder.to_owned() } else { rec.label.clone() };
        Self {
            id:          rec.id,
            kind:        rec.kind,
            label,
            city:        rec.city.clone(),
            one_way:     rec.one_way,
            speed_class: rec.speed_class,
            road_class:  rec.road_class,
            access: Access {
                no_cars:        rec.not_for_cars,
                no_pedestrians: rec.not_for_pedestrians,
                no_cyclists:    rec.not_for_cyclists,
            },
        }
    }

    /// Speed band in km/h.
    ///
    /// | class | km/h |
    /// |-------|------|
    /// | 0     | 5    |
    /// | 1     | 20   |
    /// | 2     | 40   |
    /// | 3     | 60   |
    /// | 4     | 80   |
    /// | 5     | 100  |
    /// | 6     | 110  |
    /// | other | unlimited (`f64::MAX`) |
    pub fn speed_kmh(&self) -> f64 {
        match self.speed_class {
            0 => 5.0,
            1 => 20.0,
            2 => 40.0,
            3 => 60.0,
            4 => 80.0,
            5 => 100.0,
            6 => 110.0,
            _ => f64::MAX,
        }
    }

    /// Speed band scaled down for minor road classes.
    pub fn weighted_speed(&self) -> f64 {
        let factor = match self.road_class {
            0 => 0.72,
            1 => 0.81,
            2 => 0.89,
            3 => 0.95,
            _ => 1.0,
        };
        self.speed_kmh() * factor
    }
}
