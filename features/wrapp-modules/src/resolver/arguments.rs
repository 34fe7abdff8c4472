use std::sync::Arc;

use crate::{
    errors::ArgumentError,
    types::{Injectable, Instance},
};

/// Resolved constructor or factory dependencies, ordered by position
///
/// A slot is empty when its dependency is unreached, circular, or was never
/// declared at that position.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    slots: Vec<Option<Instance>>,
}

impl Arguments {
    pub(crate) fn new(slots: Vec<Option<Instance>>) -> Self {
        Arguments { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Gets a required dependency
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ArgumentError> {
        self.instance(index)
            .ok_or(ArgumentError::Missing(index))?
            .require()
    }

    /// Gets a dependency which may be absent, a type mismatch is still an error
    pub fn optional<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>, ArgumentError> {
        self.instance(index)
            .map(|instance| instance.require::<T>())
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_access() {
        let args = Arguments::new(vec![Some(Instance::new(7u16)), None]);

        assert_eq!(args.len(), 2);
        assert_eq!(*args.get::<u16>(0).unwrap(), 7);
        assert!(matches!(args.get::<u16>(1), Err(ArgumentError::Missing(1))));
        assert!(matches!(args.get::<u16>(5), Err(ArgumentError::Missing(5))));
        assert!(args.optional::<u16>(1).unwrap().is_none());
        assert!(matches!(
            args.optional::<String>(0),
            Err(ArgumentError::DowncastFailed { actual_type: "u16", .. })
        ));
    }
}
