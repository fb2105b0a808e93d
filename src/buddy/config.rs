//! Runtime configuration for the buddy allocator

/// What `dealloc` does with a block that already spans the whole arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopBlockPolicy {
    /// Register the top block only while every free list is empty
    #[default]
    WhenExhausted,
    /// Register the top block unless it is already on its free list
    Always,
}

/// Buddy allocator settings
///
/// Geometry is fixed through const generics; these are the behaviour knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuddyConfig {
    pub top_block_policy: TopBlockPolicy,
}

impl BuddyConfig {
    pub const fn new() -> Self {
        Self {
            top_block_policy: TopBlockPolicy::WhenExhausted,
        }
    }

    pub const fn with_top_block_policy(mut self, policy: TopBlockPolicy) -> Self {
        self.top_block_policy = policy;
        self
    }
}
