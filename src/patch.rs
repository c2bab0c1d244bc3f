//! Typed updates for drafts and listeners.
//!
//! Every mutation of a draft or a listener goes through one of these enums, so
//! callers get exhaustive matching instead of string-keyed setters. The
//! `*Field` types at the bottom turn a (field, text) pair coming from the UI
//! into a patch.

use crate::editor::EditorError;
use crate::error::{AppError, Result};
use crate::models::*;

// ── Basics ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasicsPatch {
    SetName(String),
    SetDescription(String),
    SetType(LbType),
    SetRegion(String),
    SetVpc(String),
    SetSubnet(String),
    SetSecurityGroup(String),
    SetPerformanceTier(String),
}

impl LoadBalancerDraft {
    /// Shallow merge of one basics field. Presence checks happen at the step gate.
    pub fn apply(&mut self, patch: BasicsPatch) {
        match patch {
            BasicsPatch::SetName(v)             => self.name = v,
            BasicsPatch::SetDescription(v)      => self.description = v,
            BasicsPatch::SetType(t)             => self.retype(t),
            BasicsPatch::SetRegion(v)           => self.set_region(v),
            BasicsPatch::SetVpc(v)              => self.set_vpc(v),
            BasicsPatch::SetSubnet(v)           => self.subnet = v,
            BasicsPatch::SetSecurityGroup(v)    => self.security_group = v,
            BasicsPatch::SetPerformanceTier(v)  => self.performance_tier = v,
        }
    }

    /// Placement cascades: a new region invalidates the VPC, a new VPC
    /// invalidates the subnet and security group.
    fn set_region(&mut self, region: String) {
        if self.region != region {
            self.vpc.clear();
            self.subnet.clear();
            self.security_group.clear();
        }
        self.region = region;
    }

    fn set_vpc(&mut self, vpc: String) {
        if self.vpc != vpc {
            self.subnet.clear();
            self.security_group.clear();
        }
        self.vpc = vpc;
    }

    fn retype(&mut self, lb_type: LbType) {
        if self.lb_type == lb_type {
            return;
        }
        self.lb_type = lb_type;
        for listener in &mut self.listeners {
            listener.conform_to(lb_type);
        }
    }
}

impl Listener {
    /// Reshape the listener so it only carries what `lb_type` supports.
    pub fn conform_to(&mut self, lb_type: LbType) {
        match lb_type {
            LbType::Nlb => {
                self.policies.clear();
                self.rules.clear();
                self.protocol = Some(Protocol::Tcp);
                self.certificate = None;
                for pool in &mut self.pools {
                    pool.protocol = Protocol::Tcp;
                }
            }
            LbType::Alb => {
                if self.protocol == Some(Protocol::Tcp) {
                    self.protocol = None;
                }
                if self.policies.is_empty() {
                    self.policies.push(Policy::empty());
                }
                if self.rules.is_empty() {
                    self.rules.push(Rule::empty());
                }
                for pool in &mut self.pools {
                    if pool.protocol == Protocol::Tcp {
                        pool.protocol = Protocol::Http;
                    }
                }
            }
        }
        if self.pools.is_empty() {
            let protocol = if lb_type.is_alb() { Protocol::Http } else { Protocol::Tcp };
            self.pools.push(Pool::empty(protocol));
        }
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerPatch {
    SetName(String),
    SetProtocol(Protocol),
    SetPort(u16),
    SetCertificate(Option<String>),
    AddPolicy,
    RemovePolicy(String),
    Policy(String, PolicyPatch),
    AddRule,
    RemoveRule(String),
    Rule(String, RulePatch),
    AddPool,
    RemovePool(String),
    Pool(String, PoolPatch),
}

impl ListenerPatch {
    /// Fields that cannot change once a listener exists on the load balancer.
    pub fn locked_field(&self) -> Option<&'static str> {
        match self {
            Self::SetProtocol(_) => Some("protocol"),
            Self::SetPort(_)     => Some("port"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyPatch {
    SetName(String),
    SetAction(PolicyAction),
    SetRedirectUrl(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePatch {
    SetRuleType(RuleType),
    SetComparator(Comparator),
    SetValue(String),
    SetKey(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolPatch {
    SetName(String),
    SetProtocol(Protocol),
    SetAlgorithm(Algorithm),
    SetTargetGroup(String),
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Accepts absolute http(s) URLs only.
pub fn check_redirect_url(raw: &str) -> std::result::Result<(), EditorError> {
    match url::Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(()),
        Ok(_)  => Err(EditorError::InvalidRedirectUrl(raw.to_string())),
        Err(_) => Err(EditorError::InvalidRedirectUrl(raw.to_string())),
    }
}

impl Listener {
    /// Apply a structural patch. Mode rules (view-only, locked fields) are the
    /// editor's job; this only enforces what the listener itself allows.
    pub fn apply(&mut self, lb_type: LbType, patch: ListenerPatch) -> std::result::Result<(), EditorError> {
        match patch {
            ListenerPatch::SetName(v) => self.name = v,
            ListenerPatch::SetProtocol(p) => {
                if !lb_type.protocols().contains(&p) {
                    return Err(EditorError::UnsupportedProtocol { protocol: p, lb_type });
                }
                // An unset protocol counts as plain HTTP for port defaults.
                let previous_default = self.protocol.unwrap_or(Protocol::Http).default_port();
                if self.port == 0 || self.port == previous_default {
                    self.port = p.default_port();
                }
                self.protocol = Some(p);
                if !p.terminates_tls() {
                    self.certificate = None;
                }
            }
            ListenerPatch::SetPort(port) => {
                if port == 0 {
                    return Err(EditorError::InvalidPort);
                }
                self.port = port;
            }
            ListenerPatch::SetCertificate(cert) => {
                let cert = non_empty(cert);
                if cert.is_some() && !self.protocol.is_some_and(|p| p.terminates_tls()) {
                    return Err(EditorError::CertificateNotApplicable);
                }
                self.certificate = cert;
            }
            ListenerPatch::AddPolicy => {
                require_alb(lb_type, "policies")?;
                self.policies.push(Policy::empty());
            }
            ListenerPatch::RemovePolicy(id) => {
                require_alb(lb_type, "policies")?;
                if self.policies.len() <= 1 {
                    return Err(EditorError::LastEntity("policy"));
                }
                let before = self.policies.len();
                self.policies.retain(|p| p.id != id);
                if self.policies.len() == before {
                    return Err(EditorError::UnknownEntity { kind: "policy", id });
                }
            }
            ListenerPatch::Policy(id, patch) => {
                require_alb(lb_type, "policies")?;
                let policy = self
                    .policies
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or(EditorError::UnknownEntity { kind: "policy", id: id.clone() })?;
                policy.apply(patch)?;
            }
            ListenerPatch::AddRule => {
                require_alb(lb_type, "rules")?;
                self.rules.push(Rule::empty());
            }
            ListenerPatch::RemoveRule(id) => {
                require_alb(lb_type, "rules")?;
                let before = self.rules.len();
                self.rules.retain(|r| r.id != id);
                if self.rules.len() == before {
                    return Err(EditorError::UnknownEntity { kind: "rule", id });
                }
            }
            ListenerPatch::Rule(id, patch) => {
                require_alb(lb_type, "rules")?;
                let rule = self
                    .rules
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(EditorError::UnknownEntity { kind: "rule", id: id.clone() })?;
                rule.apply(patch)?;
            }
            ListenerPatch::AddPool => {
                let protocol = if lb_type.is_alb() { Protocol::Http } else { Protocol::Tcp };
                self.pools.push(Pool::empty(protocol));
            }
            ListenerPatch::RemovePool(id) => {
                if self.pools.len() <= 1 {
                    return Err(EditorError::LastEntity("pool"));
                }
                let before = self.pools.len();
                self.pools.retain(|p| p.id != id);
                if self.pools.len() == before {
                    return Err(EditorError::UnknownEntity { kind: "pool", id });
                }
            }
            ListenerPatch::Pool(id, patch) => {
                let pool = self
                    .pools
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or(EditorError::UnknownEntity { kind: "pool", id: id.clone() })?;
                if let PoolPatch::SetProtocol(p) = patch {
                    if !lb_type.protocols().contains(&p) {
                        return Err(EditorError::UnsupportedProtocol { protocol: p, lb_type });
                    }
                }
                pool.apply(patch);
            }
        }
        Ok(())
    }
}

fn require_alb(lb_type: LbType, what: &'static str) -> std::result::Result<(), EditorError> {
    if lb_type.is_alb() {
        Ok(())
    } else {
        Err(EditorError::NotApplicable(what))
    }
}

impl Policy {
    pub fn apply(&mut self, patch: PolicyPatch) -> std::result::Result<(), EditorError> {
        match patch {
            PolicyPatch::SetName(v) => self.name = v,
            PolicyPatch::SetAction(a) => {
                self.action = a;
                if a != PolicyAction::Redirect {
                    self.redirect_url = None;
                }
            }
            PolicyPatch::SetRedirectUrl(u) => {
                let u = non_empty(u);
                if let Some(ref raw) = u {
                    if self.action != PolicyAction::Redirect {
                        return Err(EditorError::NotApplicable("redirect URL"));
                    }
                    check_redirect_url(raw)?;
                }
                self.redirect_url = u;
            }
        }
        Ok(())
    }
}

impl Rule {
    pub fn apply(&mut self, patch: RulePatch) -> std::result::Result<(), EditorError> {
        match patch {
            RulePatch::SetRuleType(t) => {
                self.rule_type = t;
                if !t.needs_key() {
                    self.key = None;
                }
            }
            RulePatch::SetComparator(c) => self.comparator = c,
            RulePatch::SetValue(v) => self.value = v,
            RulePatch::SetKey(k) => {
                let k = non_empty(k);
                if k.is_some() && !self.rule_type.needs_key() {
                    return Err(EditorError::NotApplicable("rule key"));
                }
                self.key = k;
            }
        }
        Ok(())
    }
}

impl Pool {
    pub fn apply(&mut self, patch: PoolPatch) {
        match patch {
            PoolPatch::SetName(v) => self.name = v,
            PoolPatch::SetProtocol(p) => self.protocol = p,
            PoolPatch::SetAlgorithm(a) => self.algorithm = a,
            PoolPatch::SetTargetGroup(name) => {
                if name != self.target_group {
                    // Health is recomputed on save; until then nothing stale is shown.
                    self.clear_health();
                }
                self.target_group = name;
            }
        }
    }
}

// ── Field edits ───────────────────────────────────────────────────────────────

fn invalid(field: &'static str, reason: impl Into<String>) -> AppError {
    AppError::InvalidInput { field, reason: reason.into() }
}

fn parse_enum<T>(field: &'static str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T> {
    parse(value).ok_or_else(|| invalid(field, format!("unknown value '{}'", value.trim())))
}

pub fn parse_port(value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid("port", "expected a number between 1 and 65535")),
        Ok(p) => Ok(p),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicsField {
    Name,
    Description,
    Type,
    Region,
    Vpc,
    Subnet,
    SecurityGroup,
    PerformanceTier,
}

impl BasicsField {
    pub fn all() -> &'static [BasicsField] {
        &[
            Self::Name,
            Self::Description,
            Self::Type,
            Self::Region,
            Self::Vpc,
            Self::Subnet,
            Self::SecurityGroup,
            Self::PerformanceTier,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name            => "Name",
            Self::Description     => "Description",
            Self::Type            => "Type",
            Self::Region          => "Region",
            Self::Vpc             => "VPC",
            Self::Subnet          => "Subnet",
            Self::SecurityGroup   => "Security Group",
            Self::PerformanceTier => "Performance Tier",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Description | Self::Type)
    }

    pub fn value(&self, draft: &LoadBalancerDraft) -> String {
        match self {
            Self::Name            => draft.name.clone(),
            Self::Description     => draft.description.clone(),
            Self::Type            => draft.lb_type.as_str().to_string(),
            Self::Region          => draft.region.clone(),
            Self::Vpc             => draft.vpc.clone(),
            Self::Subnet          => draft.subnet.clone(),
            Self::SecurityGroup   => draft.security_group.clone(),
            Self::PerformanceTier => draft.performance_tier.clone(),
        }
    }

    pub fn to_patch(&self, value: &str) -> Result<BasicsPatch> {
        let v = value.trim().to_string();
        Ok(match self {
            Self::Name            => BasicsPatch::SetName(v),
            Self::Description     => BasicsPatch::SetDescription(value.to_string()),
            Self::Type            => BasicsPatch::SetType(parse_enum("type", &v, LbType::parse)?),
            Self::Region          => BasicsPatch::SetRegion(v),
            Self::Vpc             => BasicsPatch::SetVpc(v),
            Self::Subnet          => BasicsPatch::SetSubnet(v),
            Self::SecurityGroup   => BasicsPatch::SetSecurityGroup(v),
            Self::PerformanceTier => BasicsPatch::SetPerformanceTier(v),
        })
    }
}

/// Cursor positions inside the listener editor. Indexes point into the
/// listener's policy / rule / pool lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerField {
    Name,
    Protocol,
    Port,
    Certificate,
    PolicyName(usize),
    PolicyAction(usize),
    PolicyRedirect(usize),
    RuleType(usize),
    RuleComparator(usize),
    RuleValue(usize),
    RuleKey(usize),
    PoolName(usize),
    PoolProtocol(usize),
    PoolAlgorithm(usize),
    PoolTargetGroup(usize),
}

impl ListenerField {
    /// Visible fields for the listener as it currently stands.
    pub fn fields_for(listener: &Listener, lb_type: LbType) -> Vec<ListenerField> {
        let mut out = vec![Self::Name, Self::Protocol, Self::Port];
        if listener.protocol.is_some_and(|p| p.terminates_tls()) {
            out.push(Self::Certificate);
        }
        if lb_type.is_alb() {
            for (i, p) in listener.policies.iter().enumerate() {
                out.push(Self::PolicyName(i));
                out.push(Self::PolicyAction(i));
                if p.action == PolicyAction::Redirect {
                    out.push(Self::PolicyRedirect(i));
                }
            }
            for (i, r) in listener.rules.iter().enumerate() {
                out.push(Self::RuleType(i));
                out.push(Self::RuleComparator(i));
                out.push(Self::RuleValue(i));
                if r.rule_type.needs_key() {
                    out.push(Self::RuleKey(i));
                }
            }
        }
        for i in 0..listener.pools.len() {
            out.push(Self::PoolName(i));
            out.push(Self::PoolProtocol(i));
            out.push(Self::PoolAlgorithm(i));
            out.push(Self::PoolTargetGroup(i));
        }
        out
    }

    pub fn label(&self) -> String {
        match self {
            Self::Name               => "Name".into(),
            Self::Protocol           => "Protocol".into(),
            Self::Port               => "Port".into(),
            Self::Certificate        => "Certificate".into(),
            Self::PolicyName(i)      => format!("Policy {} name", i + 1),
            Self::PolicyAction(i)    => format!("Policy {} action", i + 1),
            Self::PolicyRedirect(i)  => format!("Policy {} redirect", i + 1),
            Self::RuleType(i)        => format!("Rule {} type", i + 1),
            Self::RuleComparator(i)  => format!("Rule {} comparator", i + 1),
            Self::RuleValue(i)       => format!("Rule {} value", i + 1),
            Self::RuleKey(i)         => format!("Rule {} key", i + 1),
            Self::PoolName(i)        => format!("Pool {} name", i + 1),
            Self::PoolProtocol(i)    => format!("Pool {} protocol", i + 1),
            Self::PoolAlgorithm(i)   => format!("Pool {} algorithm", i + 1),
            Self::PoolTargetGroup(i) => format!("Pool {} target group", i + 1),
        }
    }

    pub fn value(&self, l: &Listener) -> String {
        let policy = |i: usize| l.policies.get(i);
        let rule = |i: usize| l.rules.get(i);
        let pool = |i: usize| l.pools.get(i);
        match *self {
            Self::Name               => l.name.clone(),
            Self::Protocol           => l.protocol_str().to_string(),
            Self::Port               => if l.port == 0 { String::new() } else { l.port.to_string() },
            Self::Certificate        => l.certificate.clone().unwrap_or_default(),
            Self::PolicyName(i)      => policy(i).map(|p| p.name.clone()).unwrap_or_default(),
            Self::PolicyAction(i)    => policy(i).map(|p| p.action.as_str().to_string()).unwrap_or_default(),
            Self::PolicyRedirect(i)  => policy(i).and_then(|p| p.redirect_url.clone()).unwrap_or_default(),
            Self::RuleType(i)        => rule(i).map(|r| r.rule_type.as_str().to_string()).unwrap_or_default(),
            Self::RuleComparator(i)  => rule(i).map(|r| r.comparator.as_str().to_string()).unwrap_or_default(),
            Self::RuleValue(i)       => rule(i).map(|r| r.value.clone()).unwrap_or_default(),
            Self::RuleKey(i)         => rule(i).and_then(|r| r.key.clone()).unwrap_or_default(),
            Self::PoolName(i)        => pool(i).map(|p| p.name.clone()).unwrap_or_default(),
            Self::PoolProtocol(i)    => pool(i).map(|p| p.protocol.as_str().to_string()).unwrap_or_default(),
            Self::PoolAlgorithm(i)   => pool(i).map(|p| p.algorithm.as_str().to_string()).unwrap_or_default(),
            Self::PoolTargetGroup(i) => pool(i).map(|p| p.target_group.clone()).unwrap_or_default(),
        }
    }

    /// Translate free text typed into this field into a typed listener patch.
    pub fn to_patch(&self, l: &Listener, value: &str) -> Result<ListenerPatch> {
        let text = value.trim().to_string();
        let policy_id = |i: usize| {
            l.policies.get(i).map(|p| p.id.clone()).ok_or_else(|| invalid("policy", "no such policy"))
        };
        let rule_id = |i: usize| {
            l.rules.get(i).map(|r| r.id.clone()).ok_or_else(|| invalid("rule", "no such rule"))
        };
        let pool_id = |i: usize| {
            l.pools.get(i).map(|p| p.id.clone()).ok_or_else(|| invalid("pool", "no such pool"))
        };
        let optional = if text.is_empty() { None } else { Some(text.clone()) };

        Ok(match *self {
            Self::Name        => ListenerPatch::SetName(text),
            Self::Protocol    => ListenerPatch::SetProtocol(parse_enum("protocol", &text, Protocol::parse)?),
            Self::Port        => ListenerPatch::SetPort(parse_port(&text)?),
            Self::Certificate => ListenerPatch::SetCertificate(optional),
            Self::PolicyName(i) => ListenerPatch::Policy(policy_id(i)?, PolicyPatch::SetName(text)),
            Self::PolicyAction(i) => ListenerPatch::Policy(
                policy_id(i)?,
                PolicyPatch::SetAction(parse_enum("action", &text, PolicyAction::parse)?),
            ),
            Self::PolicyRedirect(i) => ListenerPatch::Policy(policy_id(i)?, PolicyPatch::SetRedirectUrl(optional)),
            Self::RuleType(i) => ListenerPatch::Rule(
                rule_id(i)?,
                RulePatch::SetRuleType(parse_enum("rule type", &text, RuleType::parse)?),
            ),
            Self::RuleComparator(i) => ListenerPatch::Rule(
                rule_id(i)?,
                RulePatch::SetComparator(parse_enum("comparator", &text, Comparator::parse)?),
            ),
            Self::RuleValue(i) => ListenerPatch::Rule(rule_id(i)?, RulePatch::SetValue(text)),
            Self::RuleKey(i)   => ListenerPatch::Rule(rule_id(i)?, RulePatch::SetKey(optional)),
            Self::PoolName(i)  => ListenerPatch::Pool(pool_id(i)?, PoolPatch::SetName(text)),
            Self::PoolProtocol(i) => ListenerPatch::Pool(
                pool_id(i)?,
                PoolPatch::SetProtocol(parse_enum("pool protocol", &text, Protocol::parse)?),
            ),
            Self::PoolAlgorithm(i) => ListenerPatch::Pool(
                pool_id(i)?,
                PoolPatch::SetAlgorithm(parse_enum("algorithm", &text, Algorithm::parse)?),
            ),
            Self::PoolTargetGroup(i) => ListenerPatch::Pool(pool_id(i)?, PoolPatch::SetTargetGroup(text)),
        })
    }

    /// Fixed choices for enum-valued fields; `None` means free text.
    pub fn choices(&self, lb_type: LbType) -> Option<Vec<String>> {
        let names = |v: Vec<&'static str>| -> Option<Vec<String>> {
            Some(v.into_iter().map(String::from).collect())
        };
        match self {
            Self::Protocol | Self::PoolProtocol(_) => {
                names(lb_type.protocols().iter().map(|p| p.as_str()).collect())
            }
            Self::PolicyAction(_)   => names(PolicyAction::all().iter().map(|a| a.as_str()).collect()),
            Self::RuleType(_)       => names(RuleType::all().iter().map(|t| t.as_str()).collect()),
            Self::RuleComparator(_) => names(Comparator::all().iter().map(|c| c.as_str()).collect()),
            Self::PoolAlgorithm(_)  => names(Algorithm::all().iter().map(|a| a.as_str()).collect()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn basics_patch_merges_single_field() {
        let mut d = LoadBalancerDraft::new(LbType::Alb);
        d.apply(BasicsPatch::SetName("web-lb".into()));
        d.apply(BasicsPatch::SetRegion("us-east-1".into()));
        assert_eq!(d.name, "web-lb");
        assert_eq!(d.region, "us-east-1");
        assert_eq!(d.vpc, "");
    }

    #[test]
    fn placement_changes_clear_dependent_fields() {
        let mut d = LoadBalancerDraft::new(LbType::Alb);
        d.apply(BasicsPatch::SetRegion("us-east-1".into()));
        d.apply(BasicsPatch::SetVpc("vpc-0a1b2c3d".into()));
        d.apply(BasicsPatch::SetSubnet("subnet-01a".into()));
        d.apply(BasicsPatch::SetSecurityGroup("sg-web-public".into()));

        d.apply(BasicsPatch::SetRegion("us-east-1".into()));
        assert_eq!(d.subnet, "subnet-01a");

        d.apply(BasicsPatch::SetVpc("vpc-1e2f3a4b".into()));
        assert_eq!(d.vpc, "vpc-1e2f3a4b");
        assert_eq!(d.subnet, "");
        assert_eq!(d.security_group, "");

        d.apply(BasicsPatch::SetSubnet("subnet-02a".into()));
        d.apply(BasicsPatch::SetRegion("eu-west-1".into()));
        assert_eq!(d.region, "eu-west-1");
        assert_eq!(d.vpc, "");
        assert_eq!(d.subnet, "");
    }

    #[test]
    fn switching_to_nlb_strips_policies_and_rules() {
        let mut d = LoadBalancerDraft::new(LbType::Alb);
        let mut l = Listener::new_for(LbType::Alb);
        l.protocol = Some(Protocol::Https);
        l.certificate = Some("cert-1".into());
        d.listeners.push(l);

        d.apply(BasicsPatch::SetType(LbType::Nlb));
        let l = &d.listeners[0];
        assert!(l.policies.is_empty());
        assert!(l.rules.is_empty());
        assert_eq!(l.protocol, Some(Protocol::Tcp));
        assert_eq!(l.certificate, None);
        assert_eq!(l.pools[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn switching_back_to_alb_seeds_policy_and_rule() {
        let mut l = Listener::new_for(LbType::Nlb);
        l.conform_to(LbType::Alb);
        assert_eq!(l.protocol, None);
        assert_eq!(l.policies.len(), 1);
        assert_eq!(l.rules.len(), 1);
        assert_eq!(l.pools[0].protocol, Protocol::Http);
    }

    #[test]
    fn https_moves_default_port_and_http_drops_certificate() {
        let mut l = Listener::new_for(LbType::Alb);
        l.apply(LbType::Alb, ListenerPatch::SetProtocol(Protocol::Https)).unwrap();
        assert_eq!(l.port, 443);
        l.apply(LbType::Alb, ListenerPatch::SetCertificate(Some("cert-1".into()))).unwrap();
        l.apply(LbType::Alb, ListenerPatch::SetProtocol(Protocol::Http)).unwrap();
        assert_eq!(l.certificate, None);
        assert_eq!(l.port, 80);
    }

    #[test]
    fn custom_port_survives_protocol_change() {
        let mut l = Listener::new_for(LbType::Alb);
        l.apply(LbType::Alb, ListenerPatch::SetPort(8443)).unwrap();
        l.apply(LbType::Alb, ListenerPatch::SetProtocol(Protocol::Https)).unwrap();
        assert_eq!(l.port, 8443);
    }

    #[test]
    fn tcp_is_rejected_on_alb() {
        let mut l = Listener::new_for(LbType::Alb);
        let err = l.apply(LbType::Alb, ListenerPatch::SetProtocol(Protocol::Tcp)).unwrap_err();
        assert!(matches!(err, EditorError::UnsupportedProtocol { .. }));
    }

    #[test]
    fn certificate_needs_tls_protocol() {
        let mut l = Listener::new_for(LbType::Alb);
        let err = l
            .apply(LbType::Alb, ListenerPatch::SetCertificate(Some("cert-1".into())))
            .unwrap_err();
        assert!(matches!(err, EditorError::CertificateNotApplicable));
        // Clearing is always allowed.
        l.apply(LbType::Alb, ListenerPatch::SetCertificate(Some("  ".into()))).unwrap();
    }

    #[test]
    fn policy_patch_on_nlb_is_not_applicable() {
        let mut l = Listener::new_for(LbType::Nlb);
        let err = l.apply(LbType::Nlb, ListenerPatch::AddPolicy).unwrap_err();
        assert!(matches!(err, EditorError::NotApplicable("policies")));
    }

    #[test]
    fn last_policy_and_pool_cannot_be_removed() {
        let mut l = Listener::new_for(LbType::Alb);
        let policy = l.policies[0].id.clone();
        let pool = l.pools[0].id.clone();
        assert!(matches!(
            l.apply(LbType::Alb, ListenerPatch::RemovePolicy(policy)),
            Err(EditorError::LastEntity("policy"))
        ));
        assert!(matches!(
            l.apply(LbType::Alb, ListenerPatch::RemovePool(pool)),
            Err(EditorError::LastEntity("pool"))
        ));
    }

    #[test]
    fn rules_can_be_removed_down_to_none() {
        let mut l = Listener::new_for(LbType::Alb);
        let rule = l.rules[0].id.clone();
        l.apply(LbType::Alb, ListenerPatch::RemoveRule(rule)).unwrap();
        assert!(l.rules.is_empty());
    }

    #[test]
    fn redirect_url_is_validated() {
        let mut p = Policy::empty();
        assert!(p.apply(PolicyPatch::SetRedirectUrl(Some("https://example.com".into()))).is_err());
        p.apply(PolicyPatch::SetAction(PolicyAction::Redirect)).unwrap();
        assert!(matches!(
            p.apply(PolicyPatch::SetRedirectUrl(Some("not a url".into()))),
            Err(EditorError::InvalidRedirectUrl(_))
        ));
        assert!(p.apply(PolicyPatch::SetRedirectUrl(Some("ftp://example.com".into()))).is_err());
        p.apply(PolicyPatch::SetRedirectUrl(Some("https://example.com/new".into()))).unwrap();
        assert_eq!(p.redirect_url.as_deref(), Some("https://example.com/new"));

        p.apply(PolicyPatch::SetAction(PolicyAction::Forward)).unwrap();
        assert_eq!(p.redirect_url, None);
    }

    #[test]
    fn rule_key_only_for_keyed_types() {
        let mut r = Rule::empty();
        assert!(r.apply(RulePatch::SetKey(Some("X-Env".into()))).is_err());
        r.apply(RulePatch::SetRuleType(RuleType::HttpHeader)).unwrap();
        r.apply(RulePatch::SetKey(Some("X-Env".into()))).unwrap();
        r.apply(RulePatch::SetRuleType(RuleType::PathPattern)).unwrap();
        assert_eq!(r.key, None);
    }

    #[test]
    fn changing_target_group_clears_derived_health() {
        let mut p = Pool::empty(Protocol::Http);
        p.target_group = "a".into();
        p.target_group_status = Some(HealthStatus::Healthy);
        p.target_count = Some(2);
        p.healthy_targets = Some(2);
        p.apply(PoolPatch::SetTargetGroup("b".into()));
        assert_eq!(p.target_group_status, None);
        assert_eq!(p.target_count, None);
        assert_eq!(p.healthy_targets, None);
    }

    #[test]
    fn listener_fields_follow_protocol_and_action() {
        let mut l = Listener::new_for(LbType::Alb);
        let plain = ListenerField::fields_for(&l, LbType::Alb);
        assert!(!plain.contains(&ListenerField::Certificate));
        assert!(!plain.contains(&ListenerField::PolicyRedirect(0)));

        l.protocol = Some(Protocol::Https);
        l.policies[0].action = PolicyAction::Redirect;
        let tls = ListenerField::fields_for(&l, LbType::Alb);
        assert!(tls.contains(&ListenerField::Certificate));
        assert!(tls.contains(&ListenerField::PolicyRedirect(0)));

        let nlb = ListenerField::fields_for(&Listener::new_for(LbType::Nlb), LbType::Nlb);
        assert!(!nlb.iter().any(|f| matches!(f, ListenerField::PolicyName(_) | ListenerField::RuleType(_))));
    }

    #[test]
    fn field_text_becomes_typed_patch() {
        let l = Listener::new_for(LbType::Alb);
        assert_eq!(
            ListenerField::Port.to_patch(&l, " 443 ").unwrap(),
            ListenerPatch::SetPort(443)
        );
        assert_eq!(
            ListenerField::PoolTargetGroup(0).to_patch(&l, "production-web-targets").unwrap(),
            ListenerPatch::Pool(l.pools[0].id.clone(), PoolPatch::SetTargetGroup("production-web-targets".into()))
        );
        assert!(ListenerField::Port.to_patch(&l, "0").is_err());
        assert!(ListenerField::Port.to_patch(&l, "70000").is_err());
        assert!(ListenerField::Protocol.to_patch(&l, "gopher").is_err());
        assert!(ListenerField::PolicyName(3).to_patch(&l, "x").is_err());
    }

    #[test]
    fn basics_field_parses_type() {
        assert_eq!(BasicsField::Type.to_patch("nlb").unwrap(), BasicsPatch::SetType(LbType::Nlb));
        assert!(BasicsField::Type.to_patch("classic").is_err());
        assert_eq!(
            BasicsField::Name.to_patch("  web  ").unwrap(),
            BasicsPatch::SetName("web".into())
        );
    }
}
