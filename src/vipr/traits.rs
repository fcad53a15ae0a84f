//! Common traits for appliance resources

/// Common trait for named appliance resources
pub trait ApiResource {
    /// Opaque identifier (`urn:storageos:...`)
    fn id(&self) -> &str;

    /// Human-readable name (label)
    fn name(&self) -> &str;

    /// Exact, case-sensitive name match
    fn has_name(&self, name: &str) -> bool {
        self.name() == name
    }
}
