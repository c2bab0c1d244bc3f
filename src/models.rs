//! Domain models for load balancer drafts and the target-group reference data.

use serde::{Deserialize, Serialize};

/// Fresh opaque identifier for listeners, policies, rules and pools.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ── Enumerations ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LbType {
    #[serde(rename = "application")]
    Alb,
    #[serde(rename = "network")]
    Nlb,
}

impl LbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alb => "ALB",
            Self::Nlb => "NLB",
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alb => "Application Load Balancer",
            Self::Nlb => "Network Load Balancer",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alb" | "application" => Some(Self::Alb),
            "nlb" | "network"     => Some(Self::Nlb),
            _ => None,
        }
    }
    pub fn all() -> &'static [LbType] {
        &[Self::Alb, Self::Nlb]
    }
    /// Policies and rules only exist on application load balancers.
    pub fn is_alb(&self) -> bool {
        matches!(self, Self::Alb)
    }
    /// Prefix used for storage keys and minted resource ids.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Alb => "alb",
            Self::Nlb => "nlb",
        }
    }
    pub fn protocols(&self) -> &'static [Protocol] {
        match self {
            Self::Alb => &[Protocol::Http, Protocol::Https],
            Self::Nlb => &[Protocol::Tcp],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
    Tcp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http  => "HTTP",
            Self::Https => "HTTPS",
            Self::Tcp   => "TCP",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HTTP"  => Some(Self::Http),
            "HTTPS" => Some(Self::Https),
            "TCP"   => Some(Self::Tcp),
            _ => None,
        }
    }
    /// Whether the listener terminates TLS and therefore needs a certificate.
    pub fn terminates_tls(&self) -> bool {
        matches!(self, Self::Https)
    }
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http | Self::Tcp => 80,
            Self::Https => 443,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyAction {
    Forward,
    Redirect,
    FixedResponse,
    Reject,
}

impl PolicyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward       => "forward",
            Self::Redirect      => "redirect",
            Self::FixedResponse => "fixed-response",
            Self::Reject        => "reject",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
    }
    pub fn all() -> &'static [PolicyAction] {
        &[Self::Forward, Self::Redirect, Self::FixedResponse, Self::Reject]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleType {
    PathPattern,
    HostHeader,
    HttpHeader,
    QueryString,
    HttpMethod,
    SourceIp,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PathPattern => "path-pattern",
            Self::HostHeader  => "host-header",
            Self::HttpHeader  => "http-header",
            Self::QueryString => "query-string",
            Self::HttpMethod  => "http-method",
            Self::SourceIp    => "source-ip",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }
    pub fn all() -> &'static [RuleType] {
        &[
            Self::PathPattern,
            Self::HostHeader,
            Self::HttpHeader,
            Self::QueryString,
            Self::HttpMethod,
            Self::SourceIp,
        ]
    }
    /// Header and query-string matches compare against a named key.
    pub fn needs_key(&self) -> bool {
        matches!(self, Self::HttpHeader | Self::QueryString)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparator {
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    Contains,
    Regex,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals     => "equals",
            Self::NotEquals  => "not-equals",
            Self::StartsWith => "starts-with",
            Self::EndsWith   => "ends-with",
            Self::Contains   => "contains",
            Self::Regex      => "regex",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
    pub fn all() -> &'static [Comparator] {
        &[
            Self::Equals,
            Self::NotEquals,
            Self::StartsWith,
            Self::EndsWith,
            Self::Contains,
            Self::Regex,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    RoundRobin,
    LeastConnections,
    SourceIp,
    WeightedRoundRobin,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin         => "round-robin",
            Self::LeastConnections   => "least-connections",
            Self::SourceIp           => "source-ip",
            Self::WeightedRoundRobin => "weighted-round-robin",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
    }
    pub fn all() -> &'static [Algorithm] {
        &[
            Self::RoundRobin,
            Self::LeastConnections,
            Self::SourceIp,
            Self::WeightedRoundRobin,
        ]
    }
}

/// Aggregate health of a target group, derived from its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy   => "healthy",
            Self::Degraded  => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Healthy,
    Unhealthy,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy   => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }
}

// ── Listener entities ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub action: PolicyAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl Policy {
    pub fn empty() -> Self {
        Self {
            id: new_id(),
            name: String::new(),
            action: PolicyAction::Forward,
            redirect_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub rule_type: RuleType,
    pub comparator: Comparator,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Rule {
    pub fn empty() -> Self {
        Self {
            id: new_id(),
            rule_type: RuleType::PathPattern,
            comparator: Comparator::Equals,
            value: String::new(),
            key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub protocol: Protocol,
    pub algorithm: Algorithm,
    /// Name reference into the target group registry.
    pub target_group: String,
    // Derived at listener-save time; never edited directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_group_status: Option<HealthStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy_targets: Option<usize>,
}

impl Pool {
    pub fn empty(protocol: Protocol) -> Self {
        Self {
            id: new_id(),
            name: String::new(),
            protocol,
            algorithm: Algorithm::RoundRobin,
            target_group: String::new(),
            target_group_status: None,
            target_count: None,
            healthy_targets: None,
        }
    }

    pub fn clear_health(&mut self) {
        self.target_group_status = None;
        self.target_count = None;
        self.healthy_targets = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub id: String,
    pub name: String,
    pub protocol: Option<Protocol>,
    /// 0 means "not set yet".
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub pools: Vec<Pool>,
}

impl Listener {
    /// Empty listener for the given load balancer type, with a fresh id and one
    /// default pool (plus one policy and rule on ALBs).
    pub fn new_for(lb_type: LbType) -> Self {
        match lb_type {
            LbType::Alb => Self {
                id: new_id(),
                name: String::new(),
                protocol: None,
                port: 80,
                certificate: None,
                policies: vec![Policy::empty()],
                rules: vec![Rule::empty()],
                pools: vec![Pool::empty(Protocol::Http)],
            },
            LbType::Nlb => Self {
                id: new_id(),
                name: String::new(),
                protocol: Some(Protocol::Tcp),
                port: 80,
                certificate: None,
                policies: Vec::new(),
                rules: Vec::new(),
                pools: vec![Pool::empty(Protocol::Tcp)],
            },
        }
    }

    pub fn protocol_str(&self) -> &'static str {
        self.protocol.map(|p| p.as_str()).unwrap_or("-")
    }

    /// Listener fields required before the draft can be submitted.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && self.protocol.is_some() && self.port > 0
    }

    /// Worst health across all enriched pools, if any pool carries one.
    pub fn health(&self) -> Option<HealthStatus> {
        let statuses: Vec<HealthStatus> =
            self.pools.iter().filter_map(|p| p.target_group_status).collect();
        if statuses.is_empty() {
            None
        } else if statuses.contains(&HealthStatus::Unhealthy) {
            Some(HealthStatus::Unhealthy)
        } else if statuses.contains(&HealthStatus::Degraded) {
            Some(HealthStatus::Degraded)
        } else {
            Some(HealthStatus::Healthy)
        }
    }
}

// ── Draft ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerDraft {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub lb_type: LbType,
    pub region: String,
    pub vpc: String,
    pub subnet: String,
    pub security_group: String,
    pub performance_tier: String,
    pub listeners: Vec<Listener>,
}

impl LoadBalancerDraft {
    pub fn new(lb_type: LbType) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            lb_type,
            region: String::new(),
            vpc: String::new(),
            subnet: String::new(),
            security_group: String::new(),
            performance_tier: String::new(),
            listeners: Vec::new(),
        }
    }

    pub fn listener(&self, id: &str) -> Option<&Listener> {
        self.listeners.iter().find(|l| l.id == id)
    }
}

// ── Target group reference data ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMember {
    pub name: String,
    pub ip_address: String,
    pub port: u16,
    pub weight: u32,
    pub status: MemberStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub name: String,
    pub target_members: Vec<TargetMember>,
}

impl TargetGroup {
    pub fn healthy_count(&self) -> usize {
        self.target_members
            .iter()
            .filter(|m| m.status == MemberStatus::Healthy)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_alb_listener_has_one_of_each_entity() {
        let l = Listener::new_for(LbType::Alb);
        assert_eq!(l.protocol, None);
        assert_eq!(l.port, 80);
        assert_eq!(l.policies.len(), 1);
        assert_eq!(l.rules.len(), 1);
        assert_eq!(l.pools.len(), 1);
    }

    #[test]
    fn new_nlb_listener_has_no_policies_or_rules() {
        let l = Listener::new_for(LbType::Nlb);
        assert_eq!(l.protocol, Some(Protocol::Tcp));
        assert!(l.policies.is_empty());
        assert!(l.rules.is_empty());
        assert_eq!(l.pools.len(), 1);
    }

    #[test]
    fn listener_ids_are_unique() {
        let a = Listener::new_for(LbType::Alb);
        let b = Listener::new_for(LbType::Alb);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn enum_names_parse_back() {
        assert_eq!(Protocol::parse("https"), Some(Protocol::Https));
        assert_eq!(PolicyAction::parse("fixed-response"), Some(PolicyAction::FixedResponse));
        assert_eq!(RuleType::parse("Host-Header"), Some(RuleType::HostHeader));
        assert_eq!(Algorithm::parse("least-connections"), Some(Algorithm::LeastConnections));
        assert_eq!(LbType::parse("network"), Some(LbType::Nlb));
        assert_eq!(Comparator::parse("bogus"), None);
    }

    #[test]
    fn draft_serializes_with_camel_case_fields() {
        let draft = LoadBalancerDraft::new(LbType::Alb);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "application");
        assert!(json.get("securityGroup").is_some());
        assert!(json.get("performanceTier").is_some());
    }

    #[test]
    fn listener_health_reports_worst_pool() {
        let mut l = Listener::new_for(LbType::Alb);
        let mut second = Pool::empty(Protocol::Http);
        l.pools[0].target_group_status = Some(HealthStatus::Healthy);
        second.target_group_status = Some(HealthStatus::Degraded);
        l.pools.push(second);
        assert_eq!(l.health(), Some(HealthStatus::Degraded));
    }
}
