/// Status label used when the backend sends none.
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Maps a backend status label to alert / non-alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusClassifier {
    markers: Vec<String>,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::new(["ALERT", "ERROR"])
    }
}

impl StatusClassifier {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    /// Case-sensitive substring match against the configured markers.
    pub fn is_alert(&self, status: Option<&str>) -> bool {
        match status {
            Some(status) if !status.is_empty() => {
                self.markers.iter().any(|m| status.contains(m.as_str()))
            }
            _ => false,
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}
