/// The four tracked metrics, in history column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Day,
    Week,
    Month,
    Rtp,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Day, Metric::Week, Metric::Month, Metric::Rtp];

    /// Column header in the history log.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Day => "24H",
            Metric::Week => "Week",
            Metric::Month => "Month",
            Metric::Rtp => "RTP",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Optional values for the four metrics. Absent is not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricValues([Option<f64>; 4]);

impl MetricValues {
    pub fn new(day: Option<f64>, week: Option<f64>, month: Option<f64>, rtp: Option<f64>) -> Self {
        Self([day, week, month, rtp])
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.0[metric.index()] = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Overwrites with every value present in `other`.
    pub fn overlay(&mut self, other: &MetricValues) {
        for metric in Metric::ALL {
            if let Some(v) = other.get(metric) {
                self.set(metric, v);
            }
        }
    }

    /// Fills only the metrics still absent here.
    pub fn fill_missing(&mut self, other: &MetricValues) {
        for metric in Metric::ALL {
            if self.get(metric).is_none() {
                if let Some(v) = other.get(metric) {
                    self.set(metric, v);
                }
            }
        }
    }
}
