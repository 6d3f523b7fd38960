use chrono::TimeDelta;

quantity!(Minutes, suffix: "min", precision: 0);
quantity!(Hours, suffix: "h", precision: 0);

impl From<TimeDelta> for Minutes {
    fn from(time_delta: TimeDelta) -> Self {
        Self(time_delta.as_seconds_f64() / 60.0)
    }
}
