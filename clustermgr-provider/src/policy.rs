//! Immutability policy.
//!
//! Classifies every attribute of a (desired, current) pair as unchanged,
//! updatable in place, or replace-triggering. Pure; no I/O.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::ServiceDescriptor;

/// Attributes under management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceField {
    Id,
    ServiceClassId,
    DatacenterId,
    Name,
    MsgVpnName,
    ClusterName,
    CustomRouterName,
    EventBrokerVersion,
    MaxSpoolUsage,
}

impl ServiceField {
    pub const ALL: [ServiceField; 9] = [
        ServiceField::Id,
        ServiceField::ServiceClassId,
        ServiceField::DatacenterId,
        ServiceField::Name,
        ServiceField::MsgVpnName,
        ServiceField::ClusterName,
        ServiceField::CustomRouterName,
        ServiceField::EventBrokerVersion,
        ServiceField::MaxSpoolUsage,
    ];

    /// Resource attribute name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceField::Id => "id",
            ServiceField::ServiceClassId => "serviceclass_id",
            ServiceField::DatacenterId => "datacenter_id",
            ServiceField::Name => "name",
            ServiceField::MsgVpnName => "msg_vpn_name",
            ServiceField::ClusterName => "cluster_name",
            ServiceField::CustomRouterName => "custom_router_name",
            ServiceField::EventBrokerVersion => "event_broker_version",
            ServiceField::MaxSpoolUsage => "max_spool_usage",
        }
    }

    /// Whether a difference can be applied with an update call.
    pub fn is_mutable(&self) -> bool {
        matches!(self, ServiceField::Name | ServiceField::MaxSpoolUsage)
    }
}

impl fmt::Display for ServiceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChange {
    Unchanged,
    Mutable,
    ReplaceTriggering,
}

/// Classification of every managed attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    changes: BTreeMap<ServiceField, FieldChange>,
}

impl FieldDiff {
    pub fn get(&self, field: ServiceField) -> FieldChange {
        self.changes
            .get(&field)
            .copied()
            .unwrap_or(FieldChange::Unchanged)
    }

    /// Any replace-triggering difference escalates the whole update to a replace.
    pub fn requires_replace(&self) -> bool {
        self.changes
            .values()
            .any(|c| *c == FieldChange::ReplaceTriggering)
    }

    pub fn has_mutable_changes(&self) -> bool {
        self.changes.values().any(|c| *c == FieldChange::Mutable)
    }

    pub fn is_unchanged(&self) -> bool {
        self.changes.values().all(|c| *c == FieldChange::Unchanged)
    }

    pub fn replace_triggering(&self) -> Vec<ServiceField> {
        self.fields_with(FieldChange::ReplaceTriggering)
    }

    pub fn mutable(&self) -> Vec<ServiceField> {
        self.fields_with(FieldChange::Mutable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceField, FieldChange)> + '_ {
        self.changes.iter().map(|(f, c)| (*f, *c))
    }

    fn fields_with(&self, change: FieldChange) -> Vec<ServiceField> {
        self.changes
            .iter()
            .filter(|(_, c)| **c == change)
            .map(|(f, _)| *f)
            .collect()
    }
}

fn changed_kind(field: ServiceField) -> FieldChange {
    if field.is_mutable() {
        FieldChange::Mutable
    } else {
        FieldChange::ReplaceTriggering
    }
}

fn compare<T: PartialEq>(field: ServiceField, desired: &T, current: &T) -> FieldChange {
    if desired == current {
        FieldChange::Unchanged
    } else {
        changed_kind(field)
    }
}

/// Classify each attribute of `desired` against `current`.
///
/// An unset desired identity is not compared: identity is assigned by the
/// backend. An unset desired broker version is not compared either, so
/// operators can opt out of version drift detection. That exemption applies
/// to the version only among the replace-triggering attributes. An unset
/// desired max spool usage is not compared either: the update body cannot
/// clear it, so the backend keeps its value.
pub fn classify(desired: &ServiceDescriptor, current: &ServiceDescriptor) -> FieldDiff {
    let changes = ServiceField::ALL
        .iter()
        .map(|&field| {
            let change = match field {
                ServiceField::Id => match &desired.id {
                    Some(_) => compare(field, &desired.id, &current.id),
                    None => FieldChange::Unchanged,
                },
                ServiceField::ServiceClassId => {
                    compare(field, &desired.service_class_id, &current.service_class_id)
                }
                ServiceField::DatacenterId => {
                    compare(field, &desired.datacenter_id, &current.datacenter_id)
                }
                ServiceField::Name => compare(field, &desired.name, &current.name),
                ServiceField::MsgVpnName => {
                    compare(field, &desired.msg_vpn_name, &current.msg_vpn_name)
                }
                ServiceField::ClusterName => {
                    compare(field, &desired.cluster_name, &current.cluster_name)
                }
                ServiceField::CustomRouterName => compare(
                    field,
                    &desired.custom_router_name,
                    &current.custom_router_name,
                ),
                ServiceField::EventBrokerVersion => match &desired.event_broker_version {
                    Some(_) => compare(
                        field,
                        &desired.event_broker_version,
                        &current.event_broker_version,
                    ),
                    None => FieldChange::Unchanged,
                },
                ServiceField::MaxSpoolUsage => match desired.max_spool_usage {
                    Some(_) => compare(field, &desired.max_spool_usage, &current.max_spool_usage),
                    None => FieldChange::Unchanged,
                },
            };
            (field, change)
        })
        .collect();

    FieldDiff { changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceStatus;

    fn current() -> ServiceDescriptor {
        ServiceDescriptor {
            id: Some("svc-1".to_string()),
            msg_vpn_name: Some("vpn-a".to_string()),
            cluster_name: Some("cluster-a".to_string()),
            custom_router_name: Some("router-a".to_string()),
            event_broker_version: Some("10.8.1.152-7".to_string()),
            max_spool_usage: Some(20),
            status: Some(ServiceStatus::Completed),
            ..ServiceDescriptor::new(
                "ocs-prov-test",
                "ENTERPRISE_250_STANDALONE",
                "aks-germanywestcentral",
            )
        }
    }

    /// Desired state matching `current()`, as written in configuration.
    fn desired() -> ServiceDescriptor {
        ServiceDescriptor {
            id: None,
            status: None,
            ..current()
        }
    }

    #[test]
    fn test_all_equal_is_unchanged() {
        let diff = classify(&desired(), &current());
        assert!(diff.is_unchanged());
        assert!(!diff.requires_replace());
        assert!(!diff.has_mutable_changes());
    }

    #[test]
    fn test_datacenter_change_replaces() {
        let desired = ServiceDescriptor {
            datacenter_id: "eks-us-east-1".to_string(),
            ..desired()
        };
        let diff = classify(&desired, &current());

        assert_eq!(diff.get(ServiceField::DatacenterId), FieldChange::ReplaceTriggering);
        assert_eq!(diff.replace_triggering(), vec![ServiceField::DatacenterId]);
        assert!(diff.mutable().is_empty());
        for (field, change) in diff.iter() {
            if field != ServiceField::DatacenterId {
                assert_eq!(change, FieldChange::Unchanged, "{}", field);
            }
        }
    }

    #[test]
    fn test_name_change_is_mutable() {
        let desired = ServiceDescriptor {
            name: "renamed".to_string(),
            ..desired()
        };
        let diff = classify(&desired, &current());

        assert_eq!(diff.get(ServiceField::Name), FieldChange::Mutable);
        assert!(diff.has_mutable_changes());
        assert!(!diff.requires_replace());
    }

    #[test]
    fn test_spool_change_is_mutable() {
        let desired = ServiceDescriptor {
            max_spool_usage: Some(40),
            ..desired()
        };
        assert_eq!(
            classify(&desired, &current()).get(ServiceField::MaxSpoolUsage),
            FieldChange::Mutable
        );
    }

    #[test]
    fn test_replace_wins_over_mutable() {
        let desired = ServiceDescriptor {
            name: "renamed".to_string(),
            service_class_id: "ENTERPRISE_1K_STANDALONE".to_string(),
            ..desired()
        };
        let diff = classify(&desired, &current());

        assert!(diff.requires_replace());
        assert!(diff.has_mutable_changes());
        assert_eq!(diff.mutable(), vec![ServiceField::Name]);
    }

    #[test]
    fn test_null_version_is_exempt() {
        let desired = ServiceDescriptor {
            event_broker_version: None,
            ..desired()
        };
        let diff = classify(&desired, &current());

        assert_eq!(diff.get(ServiceField::EventBrokerVersion), FieldChange::Unchanged);
        assert!(diff.is_unchanged());
    }

    #[test]
    fn test_version_change_replaces() {
        let desired = ServiceDescriptor {
            event_broker_version: Some("10.9.0.1-1".to_string()),
            ..desired()
        };
        assert_eq!(
            classify(&desired, &current()).get(ServiceField::EventBrokerVersion),
            FieldChange::ReplaceTriggering
        );
    }

    #[test]
    fn test_exemption_is_version_only() {
        let desired = ServiceDescriptor {
            msg_vpn_name: None,
            ..desired()
        };
        assert_eq!(
            classify(&desired, &current()).get(ServiceField::MsgVpnName),
            FieldChange::ReplaceTriggering
        );
    }

    #[test]
    fn test_unset_spool_usage_is_not_compared() {
        let desired = ServiceDescriptor {
            max_spool_usage: None,
            ..desired()
        };
        let diff = classify(&desired, &current());

        assert_eq!(diff.get(ServiceField::MaxSpoolUsage), FieldChange::Unchanged);
        assert!(diff.is_unchanged());
    }

    #[test]
    fn test_explicit_identity_mismatch_replaces() {
        let desired = ServiceDescriptor {
            id: Some("other".to_string()),
            ..desired()
        };
        assert_eq!(
            classify(&desired, &current()).get(ServiceField::Id),
            FieldChange::ReplaceTriggering
        );
    }
}
