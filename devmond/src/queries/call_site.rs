/// Picks the first application frame out of a raw backtrace.
#[derive(Debug, Clone, Default)]
pub struct CallSiteCleaner {
    app_root: Option<String>,
    silencers: Vec<String>,
}

impl CallSiteCleaner {
    pub fn new(app_root: Option<String>, silencers: Vec<String>) -> Self {
        let app_root = app_root
            .filter(|root| !root.is_empty())
            .map(|root| {
                if root.ends_with('/') {
                    root
                } else {
                    format!("{root}/")
                }
            });
        Self {
            app_root,
            silencers,
        }
    }

    /// Best effort: empty when no frame qualifies.
    pub fn resolve(&self, frames: &[String]) -> String {
        frames
            .iter()
            .map(|frame| frame.trim())
            .filter(|frame| !frame.is_empty())
            .filter(|frame| !self.silencers.iter().any(|s| frame.contains(s.as_str())))
            .find_map(|frame| match &self.app_root {
                Some(root) => frame.strip_prefix(root.as_str()),
                None => Some(frame),
            })
            .map(str::to_string)
            .unwrap_or_default()
    }
}
