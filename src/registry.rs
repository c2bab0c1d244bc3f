//! Target group registry and pool health enrichment.
//!
//! The registry is read-only reference data. Pool health fields are never
//! edited by hand: they are recomputed from the registry every time a
//! listener is saved.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::*;

#[derive(Debug, Clone, Default)]
pub struct TargetGroupRegistry {
    groups: BTreeMap<String, TargetGroup>,
}

/// One row of the "Registered Targets" table shown in listener view mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTarget {
    pub pool: String,
    pub target_group: String,
    pub member: TargetMember,
}

/// Health summary for one target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupHealth {
    pub status: HealthStatus,
    pub total: usize,
    pub healthy: usize,
}

/// All members healthy → healthy, none healthy → unhealthy, else degraded.
/// An empty group counts as healthy because `healthy == total` holds.
pub fn health_of(group: &TargetGroup) -> GroupHealth {
    let total = group.target_members.len();
    let healthy = group.healthy_count();
    let status = if healthy == total {
        HealthStatus::Healthy
    } else if healthy == 0 {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Degraded
    };
    GroupHealth { status, total, healthy }
}

impl TargetGroupRegistry {
    pub fn new(groups: Vec<TargetGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
        }
    }

    /// Load a registry from a JSON array of target groups.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let groups: Vec<TargetGroup> = serde_json::from_str(&content)?;
        debug!(path = %path.display(), groups = groups.len(), "loaded target group registry");
        Ok(Self::new(groups))
    }

    pub fn get(&self, name: &str) -> Option<&TargetGroup> {
        self.groups.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&TargetGroup> {
        self.get(name).ok_or_else(|| AppError::UnknownTargetGroup(name.to_string()))
    }

    pub fn groups(&self) -> impl Iterator<Item = &TargetGroup> {
        self.groups.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    /// Recompute the derived health fields of a pool. A target group name that
    /// is not in the registry is not an error; the derived fields are cleared.
    pub fn enrich_pool(&self, mut pool: Pool) -> Pool {
        match self.get(&pool.target_group) {
            Some(group) => {
                let h = health_of(group);
                pool.target_group_status = Some(h.status);
                pool.target_count = Some(h.total);
                pool.healthy_targets = Some(h.healthy);
            }
            None => pool.clear_health(),
        }
        pool
    }

    pub fn enrich_listener(&self, mut listener: Listener) -> Listener {
        listener.pools = listener
            .pools
            .into_iter()
            .map(|p| self.enrich_pool(p))
            .collect();
        listener
    }

    /// Every member of every pool's target group, in pool order.
    pub fn registered_targets(&self, listener: &Listener) -> Vec<RegisteredTarget> {
        listener
            .pools
            .iter()
            .filter_map(|pool| self.get(&pool.target_group).map(|g| (pool, g)))
            .flat_map(|(pool, group)| {
                group.target_members.iter().map(move |m| RegisteredTarget {
                    pool: pool.name.clone(),
                    target_group: group.name.clone(),
                    member: m.clone(),
                })
            })
            .collect()
    }

    /// Built-in reference table.
    pub fn builtin() -> Self {
        use MemberStatus::{Healthy, Unhealthy};
        let m = |name: &str, ip: &str, port: u16, weight: u32, status: MemberStatus| TargetMember {
            name: name.to_string(),
            ip_address: ip.to_string(),
            port,
            weight,
            status,
        };
        let g = |name: &str, members: Vec<TargetMember>| TargetGroup {
            name: name.to_string(),
            target_members: members,
        };
        Self::new(vec![
            g("production-web-targets", vec![
                m("web-server-01", "10.0.1.10", 8080, 100, Healthy),
                m("web-server-02", "10.0.1.11", 8080, 100, Healthy),
                m("web-server-03", "10.0.1.12", 8080, 100, Healthy),
                m("web-server-04", "10.0.1.13", 8080, 50, Unhealthy),
            ]),
            g("api-service-targets", vec![
                m("api-server-01", "10.0.2.20", 3000, 100, Healthy),
                m("api-server-02", "10.0.2.21", 3000, 100, Healthy),
            ]),
            g("staging-web-targets", vec![
                m("staging-web-01", "10.1.1.10", 8080, 100, Unhealthy),
            ]),
            g("tcp-backend-targets", vec![
                m("db-proxy-01", "10.0.3.30", 5432, 100, Healthy),
                m("db-proxy-02", "10.0.3.31", 5432, 100, Unhealthy),
                m("db-proxy-03", "10.0.3.32", 5432, 100, Healthy),
            ]),
            g("batch-workers-targets", vec![
                m("worker-01", "10.0.4.40", 9000, 100, Unhealthy),
                m("worker-02", "10.0.4.41", 9000, 100, Unhealthy),
            ]),
            g("empty-targets", vec![]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn group(statuses: &[MemberStatus]) -> TargetGroup {
        TargetGroup {
            name: "g".into(),
            target_members: statuses
                .iter()
                .enumerate()
                .map(|(i, s)| TargetMember {
                    name: format!("m{i}"),
                    ip_address: format!("10.0.0.{i}"),
                    port: 80,
                    weight: 1,
                    status: *s,
                })
                .collect(),
        }
    }

    fn pool_for(target_group: &str) -> Pool {
        let mut p = Pool::empty(Protocol::Http);
        p.target_group = target_group.to_string();
        p
    }

    #[test]
    fn health_derivation() {
        use MemberStatus::{Healthy, Unhealthy};
        let h = health_of(&group(&[Healthy, Healthy, Unhealthy]));
        assert_eq!(h, GroupHealth { status: HealthStatus::Degraded, total: 3, healthy: 2 });
        assert_eq!(health_of(&group(&[Healthy, Healthy])).status, HealthStatus::Healthy);
        assert_eq!(health_of(&group(&[Unhealthy])).status, HealthStatus::Unhealthy);
    }

    #[test]
    fn empty_group_reports_healthy() {
        let h = health_of(&group(&[]));
        assert_eq!(h, GroupHealth { status: HealthStatus::Healthy, total: 0, healthy: 0 });
    }

    #[test]
    fn enrich_pool_from_builtin_registry() {
        let reg = TargetGroupRegistry::builtin();
        let p = reg.enrich_pool(pool_for("production-web-targets"));
        assert_eq!(p.target_group_status, Some(HealthStatus::Degraded));
        assert_eq!(p.target_count, Some(4));
        assert_eq!(p.healthy_targets, Some(3));
    }

    #[test]
    fn unknown_group_leaves_health_unset() {
        let reg = TargetGroupRegistry::builtin();
        let mut stale = pool_for("does-not-exist");
        stale.target_group_status = Some(HealthStatus::Healthy);
        stale.target_count = Some(9);
        let p = reg.enrich_pool(stale);
        assert_eq!(p.target_group, "does-not-exist");
        assert_eq!(p.target_group_status, None);
        assert_eq!(p.target_count, None);
        assert_eq!(p.healthy_targets, None);
    }

    #[test]
    fn enrichment_is_deterministic() {
        let reg = TargetGroupRegistry::builtin();
        let once = reg.enrich_pool(pool_for("tcp-backend-targets"));
        let twice = reg.enrich_pool(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn registered_targets_flatten_all_pools() {
        let reg = TargetGroupRegistry::builtin();
        let mut l = Listener::new_for(LbType::Alb);
        l.pools[0] = pool_for("production-web-targets");
        l.pools[0].name = "web".into();
        let mut api = pool_for("api-service-targets");
        api.name = "api".into();
        l.pools.push(api);
        l.pools.push(pool_for("missing"));

        let rows = reg.registered_targets(&l);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].pool, "web");
        assert_eq!(rows[0].member.name, "web-server-01");
        assert_eq!(rows[5].target_group, "api-service-targets");
    }

    #[test]
    fn registry_loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(
            &path,
            r#"[{"name":"edge","targetMembers":[
                {"name":"a","ipAddress":"10.9.0.1","port":443,"weight":10,"status":"healthy"},
                {"name":"b","ipAddress":"10.9.0.2","port":443,"weight":10,"status":"unhealthy"}]}]"#,
        )
        .unwrap();
        let reg = TargetGroupRegistry::from_file(&path).unwrap();
        assert_eq!(reg.names(), vec!["edge".to_string()]);
        assert_eq!(health_of(reg.require("edge").unwrap()).status, HealthStatus::Degraded);
        assert!(reg.require("nope").is_err());
    }
}
