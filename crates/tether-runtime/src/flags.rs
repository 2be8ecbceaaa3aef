//! Binding behavior flags.

use bitflags::bitflags;

bitflags! {
    /// Flags passed to [`bind`](crate::binding::bind) and the builder.
    ///
    /// The empty set is the default: one-way, sync-on-change only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindingFlags: u8 {
        /// Also propagate target changes back to the source.
        const BIDIRECTIONAL = 1 << 0;
        /// Push the current source value to the target at bind time.
        const SYNC_CREATE = 1 << 1;
        /// Negate boolean values in both directions. Both properties must be `bool`.
        const INVERT_BOOLEAN = 1 << 2;
    }
}

impl BindingFlags {
    /// One-way binding that syncs on change only.
    pub const DEFAULT: Self = Self::empty();

    /// Stable, `|`-separated names for logs.
    #[must_use]
    pub fn describe(self) -> String {
        if self.is_empty() {
            return "DEFAULT".to_owned();
        }
        self.iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert_eq!(BindingFlags::DEFAULT, BindingFlags::empty());
        assert_eq!(BindingFlags::default(), BindingFlags::DEFAULT);
        assert!(!BindingFlags::DEFAULT.contains(BindingFlags::SYNC_CREATE));
    }

    #[test]
    fn describe_names_flags() {
        assert_eq!(BindingFlags::DEFAULT.describe(), "DEFAULT");
        assert_eq!(
            (BindingFlags::SYNC_CREATE | BindingFlags::BIDIRECTIONAL).describe(),
            "BIDIRECTIONAL|SYNC_CREATE"
        );
    }
}
