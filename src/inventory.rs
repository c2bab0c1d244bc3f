//! Existing load balancers, used to seed edit-mode drafts.

use crate::error::{AppError, Result};
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LbStatus {
    Active,
    Provisioning,
}

impl LbStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active       => "active",
            Self::Provisioning => "provisioning",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadBalancerRecord {
    pub id: String,
    pub status: LbStatus,
    pub dns_name: String,
    pub config: LoadBalancerDraft,
}

impl LoadBalancerRecord {
    pub fn to_draft(&self) -> LoadBalancerDraft {
        self.config.clone()
    }
}

pub fn find(id: &str) -> Result<LoadBalancerRecord> {
    load_balancers()
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::UnknownLoadBalancer(id.to_string()))
}

fn pool(name: &str, protocol: Protocol, algorithm: Algorithm, target_group: &str) -> Pool {
    Pool {
        name: name.to_string(),
        algorithm,
        target_group: target_group.to_string(),
        ..Pool::empty(protocol)
    }
}

fn listener(name: &str, protocol: Protocol, port: u16, pools: Vec<Pool>) -> Listener {
    Listener {
        id: format!("lst-{}-{}", name, port),
        name: name.to_string(),
        protocol: Some(protocol),
        port,
        certificate: None,
        policies: Vec::new(),
        rules: Vec::new(),
        pools,
    }
}

pub fn load_balancers() -> Vec<LoadBalancerRecord> {
    let mut https = listener(
        "web-https",
        Protocol::Https,
        443,
        vec![pool("web-pool", Protocol::Http, Algorithm::RoundRobin, "production-web-targets")],
    );
    https.certificate = Some("cert-prod-wildcard".into());
    https.policies = vec![Policy {
        name: "forward-web".into(),
        ..Policy::empty()
    }];
    https.rules = vec![Rule {
        value: "/*".into(),
        rule_type: RuleType::PathPattern,
        ..Rule::empty()
    }];

    let mut http = listener(
        "web-http",
        Protocol::Http,
        80,
        vec![pool("web-pool", Protocol::Http, Algorithm::RoundRobin, "production-web-targets")],
    );
    http.policies = vec![Policy {
        name: "redirect-to-https".into(),
        action: PolicyAction::Redirect,
        redirect_url: Some("https://www.example.com/".into()),
        ..Policy::empty()
    }];
    http.rules = vec![Rule {
        value: "www.example.com".into(),
        rule_type: RuleType::HostHeader,
        ..Rule::empty()
    }];

    let mut api = listener(
        "api",
        Protocol::Http,
        8080,
        vec![pool("api-pool", Protocol::Http, Algorithm::LeastConnections, "api-service-targets")],
    );
    api.policies = vec![Policy { name: "forward-api".into(), ..Policy::empty() }];
    api.rules = vec![Rule {
        rule_type: RuleType::HttpHeader,
        key: Some("X-Api-Version".into()),
        value: "v2".into(),
        ..Rule::empty()
    }];

    let tcp = listener(
        "postgres",
        Protocol::Tcp,
        5432,
        vec![pool("db-pool", Protocol::Tcp, Algorithm::SourceIp, "tcp-backend-targets")],
    );

    vec![
        LoadBalancerRecord {
            id: "alb-7f3a9c21".into(),
            status: LbStatus::Active,
            dns_name: "web-prod-alb-1234567890.us-east-1.elb.example.com".into(),
            config: LoadBalancerDraft {
                name: "web-prod-alb".into(),
                description: "Public entry point for the production web tier".into(),
                lb_type: LbType::Alb,
                region: "us-east-1".into(),
                vpc: "vpc-0a1b2c3d".into(),
                subnet: "subnet-01a".into(),
                security_group: "sg-web-public".into(),
                performance_tier: "premium".into(),
                listeners: vec![https, http],
            },
        },
        LoadBalancerRecord {
            id: "alb-2b8e4d10".into(),
            status: LbStatus::Active,
            dns_name: "api-internal-alb.us-east-1.elb.example.com".into(),
            config: LoadBalancerDraft {
                name: "api-internal-alb".into(),
                description: "Internal API routing".into(),
                lb_type: LbType::Alb,
                region: "us-east-1".into(),
                vpc: "vpc-0a1b2c3d".into(),
                subnet: "subnet-01c".into(),
                security_group: "sg-internal".into(),
                performance_tier: "standard".into(),
                listeners: vec![api],
            },
        },
        LoadBalancerRecord {
            id: "nlb-5c1f7e92".into(),
            status: LbStatus::Provisioning,
            dns_name: "db-proxy-nlb.us-east-1.elb.example.com".into(),
            config: LoadBalancerDraft {
                name: "db-proxy-nlb".into(),
                description: String::new(),
                lb_type: LbType::Nlb,
                region: "us-east-1".into(),
                vpc: "vpc-0a1b2c3d".into(),
                subnet: "subnet-01c".into(),
                security_group: "sg-internal".into(),
                performance_tier: "ultra".into(),
                listeners: vec![tcp],
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_known_record() {
        let rec = find("nlb-5c1f7e92").unwrap();
        assert_eq!(rec.config.lb_type, LbType::Nlb);
        assert!(matches!(find("alb-nope"), Err(AppError::UnknownLoadBalancer(_))));
    }

    #[test]
    fn seeded_listeners_fit_their_type() {
        for rec in load_balancers() {
            let lb_type = rec.config.lb_type;
            assert!(!rec.config.listeners.is_empty(), "{} has no listeners", rec.id);
            for l in &rec.config.listeners {
                assert!(l.is_complete());
                assert_eq!(l.policies.is_empty(), !lb_type.is_alb());
                assert!(lb_type.protocols().contains(&l.protocol.unwrap()));
            }
        }
    }
}
