use crate::coordinate::RawData;
use crate::location_provider::LocationRequest;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ProcessResult {
    Accept = 0,
    // negative values are for fixes that never reach the tracker.
    TooSoon = -1,
    TooClose = -2,
    OutOfOrder = -3,
    Inaccurate = -4,
}

impl ProcessResult {
    pub fn to_int(&self) -> i8 {
        *self as i8
    }

    pub fn is_accepted(&self) -> bool {
        *self == ProcessResult::Accept
    }
}

/// The filter a platform location feed applies before delivering a fix:
/// a minimum time between updates and a minimum displacement.
pub struct GpsProcessor {
    request: LocationRequest,
    last_data: Option<RawData>,
}

impl GpsProcessor {
    pub fn new(request: LocationRequest) -> Self {
        GpsProcessor {
            request,
            last_data: None,
        }
    }

    pub fn last_data(&self) -> Option<&RawData> {
        self.last_data.as_ref()
    }

    pub fn preprocess(&mut self, curr_data: &RawData) -> ProcessResult {
        let should_ignore = match (curr_data.accuracy, self.request.max_accuracy_m) {
            (Some(accuracy), Some(threshold)) => accuracy > threshold,
            _ => false,
        };

        let result = if should_ignore {
            ProcessResult::Inaccurate
        } else {
            match &self.last_data {
                None => ProcessResult::Accept,
                Some(last_data) => {
                    let time_diff_in_ms = curr_data
                        .timestamp_ms
                        .and_then(|now| last_data.timestamp_ms.map(|prev| now - prev));
                    match time_diff_in_ms {
                        // NOTE: a fix from a while ago would draw a line back
                        // in time, so we drop it.
                        Some(diff) if diff < 0 => ProcessResult::OutOfOrder,
                        Some(diff) if diff < self.request.min_update_interval_ms as i64 => {
                            ProcessResult::TooSoon
                        }
                        _ => {
                            let distance = last_data
                                .coordinate()
                                .distance_to(&curr_data.coordinate());
                            if distance < self.request.min_distance_m {
                                ProcessResult::TooClose
                            } else {
                                ProcessResult::Accept
                            }
                        }
                    }
                }
            }
        };
        if result.is_accepted() {
            self.last_data = Some(curr_data.clone());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::gps_processor::ProcessResult;

    #[test]
    fn to_int() {
        assert_eq!(ProcessResult::Accept.to_int(), 0);
        assert_eq!(ProcessResult::TooClose.to_int(), -2);
    }
}
