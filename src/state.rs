//! Keyed load state shared by every view.
//!
//! A view starts a load for a key (an offset, a name, a URL). Results come back
//! tagged with the key they were requested for and are dropped unless that key
//! is still the one being loaded.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase<T> {
    Idle,
    Loading,
    Success(T),
    NotFound,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct Tracked<K, T> {
    key: Option<K>,
    phase: Phase<T>,
}

impl<K, T> Default for Tracked<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            phase: Phase::Idle,
        }
    }
}

impl<K: PartialEq, T> Tracked<K, T> {
    pub fn phase(&self) -> &Phase<T> {
        &self.phase
    }

    pub fn success(&self) -> Option<&T> {
        match &self.phase {
            Phase::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn is_for(&self, key: &K) -> bool {
        self.key.as_ref() == Some(key)
    }

    /// Restart the machine for `key`. Anything still in flight for an older key
    /// will be ignored when it lands.
    pub fn start(&mut self, key: K) {
        self.key = Some(key);
        self.phase = Phase::Loading;
    }

    /// Terminal not-found without issuing a fetch.
    pub fn not_found(&mut self, key: K) {
        self.key = Some(key);
        self.phase = Phase::NotFound;
    }

    pub fn reset(&mut self) {
        self.key = None;
        self.phase = Phase::Idle;
    }

    /// Apply a result. Returns `false` (and changes nothing) when the result is
    /// stale or the machine already settled.
    pub fn resolve(&mut self, key: &K, outcome: Result<T, PageError>) -> bool {
        if !self.is_for(key) || !self.is_loading() {
            return false;
        }
        self.phase = match outcome {
            Ok(value) => Phase::Success(value),
            Err(PageError::NotFound) => Phase::NotFound,
            Err(PageError::Failed(message)) => Phase::Error(message),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_idle_loading_success() {
        let mut t: Tracked<usize, &str> = Tracked::default();
        assert_eq!(t.phase(), &Phase::Idle);
        t.start(50);
        assert!(t.is_loading());
        assert!(t.resolve(&50, Ok("page")));
        assert_eq!(t.success(), Some(&"page"));
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut t: Tracked<String, u32> = Tracked::default();
        t.start("pikachu".into());
        t.start("raichu".into());
        assert!(!t.resolve(&"pikachu".to_string(), Ok(25)));
        assert!(t.is_loading());
        assert!(t.resolve(&"raichu".to_string(), Ok(26)));
        assert_eq!(t.success(), Some(&26));
    }

    #[test]
    fn settled_states_are_terminal() {
        let mut t: Tracked<usize, u32> = Tracked::default();
        t.start(0);
        assert!(t.resolve(&0, Err(PageError::Failed("boom".into()))));
        assert_eq!(t.phase(), &Phase::Error("boom".into()));
        assert!(!t.resolve(&0, Ok(1)));
        assert_eq!(t.phase(), &Phase::Error("boom".into()));

        t.not_found(1);
        assert!(!t.resolve(&1, Ok(1)));
        assert_eq!(t.phase(), &Phase::NotFound);
    }
}
