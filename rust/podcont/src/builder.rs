use bytemuck::Pod;
use podcont_common::Result;

use crate::{container::Container, policy::ExpandPolicy};

/// Configures and creates a [`Container`].
///
/// ```
/// use podcont::{ContainerBuilder, ExpandPolicy};
///
/// let container = ContainerBuilder::<u64, u32>::new()
///     .initial_capacity(16)
///     .expand_policy(ExpandPolicy::new(8))
///     .user_info(0xdead_beef)
///     .build()
///     .unwrap();
/// assert_eq!(container.capacity(), 16);
/// assert_eq!(container.user_info(), Some(&0xdead_beef));
/// ```
#[derive(Debug, Clone)]
pub struct ContainerBuilder<T, H> {
    initial_capacity: usize,
    expand_policy: ExpandPolicy,
    user_info: H,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Pod, H: Pod> ContainerBuilder<T, H> {
    pub fn new() -> Self {
        ContainerBuilder {
            initial_capacity: 0,
            expand_policy: ExpandPolicy::DEFAULT,
            user_info: H::zeroed(),
            _marker: Default::default(),
        }
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn expand_policy(mut self, policy: impl Into<ExpandPolicy>) -> Self {
        self.expand_policy = policy.into();
        self
    }

    pub fn user_info(mut self, user_info: H) -> Self {
        self.user_info = user_info;
        self
    }

    pub fn build(self) -> Result<Container<T, H>> {
        let mut container =
            Container::with_capacity_and_policy(self.initial_capacity, self.expand_policy)?;
        container.set_user_info(self.user_info)?;
        Ok(container)
    }
}

impl<T: Pod, H: Pod> Default for ContainerBuilder<T, H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let container = ContainerBuilder::<u32, u16>::default().build().unwrap();
        assert_eq!(container.capacity(), 0);
        assert_eq!(container.len(), 0);
        assert_eq!(container.user_info(), Some(&0));
        assert_eq!(container.expand_policy(), Some(ExpandPolicy::DEFAULT));
    }

    #[test]
    fn test_builder_zero_policy_is_normalized() {
        let container = ContainerBuilder::<u32, u16>::new()
            .expand_policy(0)
            .build()
            .unwrap();
        assert_eq!(container.expand_policy().unwrap().raw(), -1);
    }

    #[test]
    fn test_builder_capacity_overflow() {
        let err = ContainerBuilder::<u64, u32>::new()
            .initial_capacity(usize::MAX)
            .build()
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            podcont_common::ErrorKind::CapacityOverflow { .. }
        ));
    }
}
