/// Computes the dimension key (partition) bounding a sequence's guarantees.
///
/// Uniqueness, ordering, and contiguity of generated values hold within one
/// dimension key's lifetime; nothing is guaranteed across keys. Resolution is
/// deterministic given its context (typically wall-clock time) and has no
/// side effects.
pub trait DimensionResolver {
    /// The key type produced by this resolver.
    type Key;

    /// Resolves the dimension key for the current generation context.
    fn resolve(&self) -> Self::Key;
}
