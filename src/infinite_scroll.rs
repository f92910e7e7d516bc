//! Sentinel-visibility trigger that asks for the next page.

/// Loader state the trigger consults before firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub has_next_page: bool,
    pub is_fetching_next_page: bool,
}

/// Edge-triggered "load more" decision for one sentinel.
///
/// Fires at most once per not-visible to visible transition, and only while
/// mounted. Remounting and [`InfiniteScroll::rearm`] forget the last seen
/// visibility, the same way a fresh observer reports the current intersection.
#[derive(Debug, Default)]
pub struct InfiniteScroll {
    mounted: bool,
    was_visible: bool,
}

impl InfiniteScroll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts observing the sentinel.
    pub fn mount(&mut self) {
        self.mounted = true;
        self.was_visible = false;
    }

    /// Stops observing; visibility reports are ignored until the next mount.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.was_visible = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Re-subscribes after the loader's state changed (a page landed).
    pub fn rearm(&mut self) {
        self.was_visible = false;
    }

    /// Records a visibility report; `true` means "fetch the next page now".
    pub fn on_visibility(&mut self, visible: bool, state: ScrollState) -> bool {
        if !self.mounted {
            return false;
        }
        let rising_edge = visible && !self.was_visible;
        self.was_visible = visible;
        rising_edge && state.has_next_page && !state.is_fetching_next_page
    }
}
