/// What a measurement session acquires per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementType {
    /// Distance only.
    Distance,
    /// Distance paired with reflection intensity.
    DistanceIntensity,
    /// Up to three distances per step, for transparent or edge surfaces.
    Multiecho,
    /// Up to three (distance, intensity) pairs per step.
    MultiechoIntensity,
}

impl MeasurementType {
    /// Returns `true` for the modes that deliver intensity data.
    pub fn has_intensity(&self) -> bool {
        matches!(
            self,
            MeasurementType::DistanceIntensity | MeasurementType::MultiechoIntensity
        )
    }

    /// Returns `true` for the modes that deliver more than one echo per
    /// step.
    pub fn is_multiecho(&self) -> bool {
        matches!(
            self,
            MeasurementType::Multiecho | MeasurementType::MultiechoIntensity
        )
    }
}

/// Operating state reported by the `%ST` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Unknown,
    Booting,
    Idle,
    Sleep,
    WakingUp,
    TimeAdjustment,
    SingleScan,
    MultiScan,
    LnBooting,
    LnMeasurement,
    LnResponding,
    ErrorDetected,
    FirmwareUpdate,
    Development,
}
