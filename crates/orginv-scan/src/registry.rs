//! Scanner registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::scanner::Scanner;
use crate::scanners::{
    Ec2InstanceScanner, IamRoleScanner, LambdaFunctionScanner, RdsInstanceScanner, S3BucketScanner,
    VpcScanner,
};

/// Static mapping from resource-type identifier to scanner implementation
///
/// Built once at startup and shared read-only with the scheduler. Iteration
/// order is the registration order.
pub struct ScannerRegistry {
    scanners: Vec<Arc<dyn Scanner>>,
    by_id: HashMap<&'static str, usize>,
}

impl ScannerRegistry {
    /// Build a registry from the given scanners
    ///
    /// # Panics
    /// Panics if two scanners declare the same resource-type identifier;
    /// this is a programming error caught at startup.
    #[must_use]
    pub fn new(scanners: Vec<Arc<dyn Scanner>>) -> Self {
        let mut by_id = HashMap::with_capacity(scanners.len());
        for (idx, scanner) in scanners.iter().enumerate() {
            let id = scanner.resource_type();
            assert!(
                by_id.insert(id, idx).is_none(),
                "duplicate scanner resource type: {id}"
            );
        }
        Self { scanners, by_id }
    }

    /// The built-in scanner table
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            // Compute
            Arc::new(Ec2InstanceScanner),
            Arc::new(LambdaFunctionScanner),
            // Database
            Arc::new(RdsInstanceScanner),
            // Networking
            Arc::new(VpcScanner),
            // Global
            Arc::new(S3BucketScanner),
            Arc::new(IamRoleScanner),
        ])
    }

    /// Look up a scanner by resource-type identifier
    #[must_use]
    pub fn get(&self, resource_type: &str) -> Option<&Arc<dyn Scanner>> {
        self.by_id.get(resource_type).map(|&idx| &self.scanners[idx])
    }

    /// Iterate over all registered scanners in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Scanner>> {
        self.scanners.iter()
    }

    /// Registered resource-type identifiers in registration order
    #[must_use]
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.scanners.iter().map(|s| s.resource_type()).collect()
    }

    /// Number of registered scanners
    #[must_use]
    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique_and_resolvable() {
        let registry = ScannerRegistry::builtin();

        assert!(!registry.is_empty());
        for scanner in registry.iter() {
            let found = registry.get(scanner.resource_type());
            assert!(found.is_some());
            assert_eq!(
                found.unwrap().resource_type(),
                scanner.resource_type()
            );
        }
    }

    #[test]
    fn builtin_global_flags() {
        let registry = ScannerRegistry::builtin();

        let globals: Vec<_> = registry
            .iter()
            .filter(|s| s.is_global())
            .map(|s| s.resource_type())
            .collect();

        assert_eq!(globals, vec!["s3-buckets", "iam-roles"]);
    }

    #[test]
    #[should_panic(expected = "duplicate scanner resource type")]
    fn duplicate_ids_panic() {
        ScannerRegistry::new(vec![
            Arc::new(Ec2InstanceScanner),
            Arc::new(Ec2InstanceScanner),
        ]);
    }
}
