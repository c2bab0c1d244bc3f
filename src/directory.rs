//! Network directory: regions, VPCs, subnets, security groups and the
//! performance tiers a load balancer can be placed on. Static reference data.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vpc {
    pub id: &'static str,
    pub name: &'static str,
    pub region: &'static str,
    pub cidr: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub id: &'static str,
    pub name: &'static str,
    pub vpc: &'static str,
    pub region: &'static str,
    pub zone: &'static str,
    pub cidr: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroup {
    pub id: &'static str,
    pub name: &'static str,
    pub vpc: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceTier {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub const REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-west-1", "ap-south-1"];

const VPCS: &[Vpc] = &[
    Vpc { id: "vpc-0a1b2c3d", name: "production-vpc", region: "us-east-1", cidr: "10.0.0.0/16" },
    Vpc { id: "vpc-1e2f3a4b", name: "staging-vpc",    region: "us-east-1", cidr: "10.1.0.0/16" },
    Vpc { id: "vpc-5c6d7e8f", name: "analytics-vpc",  region: "us-west-2", cidr: "10.2.0.0/16" },
    Vpc { id: "vpc-9a0b1c2d", name: "eu-core-vpc",    region: "eu-west-1", cidr: "10.3.0.0/16" },
    Vpc { id: "vpc-3e4f5a6b", name: "mumbai-vpc",     region: "ap-south-1", cidr: "10.4.0.0/16" },
];

const SUBNETS: &[Subnet] = &[
    Subnet { id: "subnet-01a", name: "prod-public-1a",    vpc: "vpc-0a1b2c3d", region: "us-east-1",  zone: "us-east-1a",  cidr: "10.0.1.0/24" },
    Subnet { id: "subnet-01b", name: "prod-public-1b",    vpc: "vpc-0a1b2c3d", region: "us-east-1",  zone: "us-east-1b",  cidr: "10.0.2.0/24" },
    Subnet { id: "subnet-01c", name: "prod-private-1a",   vpc: "vpc-0a1b2c3d", region: "us-east-1",  zone: "us-east-1a",  cidr: "10.0.10.0/24" },
    Subnet { id: "subnet-02a", name: "staging-public-1a", vpc: "vpc-1e2f3a4b", region: "us-east-1",  zone: "us-east-1a",  cidr: "10.1.1.0/24" },
    Subnet { id: "subnet-03a", name: "analytics-2a",      vpc: "vpc-5c6d7e8f", region: "us-west-2",  zone: "us-west-2a",  cidr: "10.2.1.0/24" },
    Subnet { id: "subnet-04a", name: "eu-core-1a",        vpc: "vpc-9a0b1c2d", region: "eu-west-1",  zone: "eu-west-1a",  cidr: "10.3.1.0/24" },
    Subnet { id: "subnet-05a", name: "mumbai-1a",         vpc: "vpc-3e4f5a6b", region: "ap-south-1", zone: "ap-south-1a", cidr: "10.4.1.0/24" },
];

const SECURITY_GROUPS: &[SecurityGroup] = &[
    SecurityGroup { id: "sg-web-public", name: "web-public",     vpc: "vpc-0a1b2c3d" },
    SecurityGroup { id: "sg-internal",   name: "internal-only",  vpc: "vpc-0a1b2c3d" },
    SecurityGroup { id: "sg-staging",    name: "staging-web",    vpc: "vpc-1e2f3a4b" },
    SecurityGroup { id: "sg-analytics",  name: "analytics-lb",   vpc: "vpc-5c6d7e8f" },
    SecurityGroup { id: "sg-eu-web",     name: "eu-web",         vpc: "vpc-9a0b1c2d" },
    SecurityGroup { id: "sg-mumbai",     name: "mumbai-default", vpc: "vpc-3e4f5a6b" },
];

const TIERS: &[PerformanceTier] = &[
    PerformanceTier { id: "standard", label: "Standard", description: "Up to 10k connections/s" },
    PerformanceTier { id: "premium",  label: "Premium",  description: "Up to 100k connections/s" },
    PerformanceTier { id: "ultra",    label: "Ultra",    description: "Dedicated capacity, 1M connections/s" },
];

pub fn vpcs_in(region: &str) -> Vec<&'static Vpc> {
    VPCS.iter().filter(|v| region.is_empty() || v.region == region).collect()
}

pub fn subnets_in(vpc: &str) -> Vec<&'static Subnet> {
    SUBNETS.iter().filter(|s| vpc.is_empty() || s.vpc == vpc).collect()
}

pub fn security_groups_in(vpc: &str) -> Vec<&'static SecurityGroup> {
    SECURITY_GROUPS.iter().filter(|g| vpc.is_empty() || g.vpc == vpc).collect()
}

pub fn performance_tiers() -> &'static [PerformanceTier] {
    TIERS
}

pub fn find_vpc(id: &str) -> Option<&'static Vpc> {
    VPCS.iter().find(|v| v.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vpcs_filter_by_region() {
        let east: Vec<&str> = vpcs_in("us-east-1").iter().map(|v| v.id).collect();
        assert_eq!(east, vec!["vpc-0a1b2c3d", "vpc-1e2f3a4b"]);
        assert_eq!(vpcs_in("").len(), VPCS.len());
    }

    #[test]
    fn subnets_and_groups_follow_vpc() {
        assert!(subnets_in("vpc-0a1b2c3d").iter().all(|s| s.vpc == "vpc-0a1b2c3d"));
        assert_eq!(security_groups_in("vpc-1e2f3a4b").len(), 1);
        assert!(subnets_in("vpc-unknown").is_empty());
    }

    #[test]
    fn every_subnet_belongs_to_a_known_vpc_in_the_same_region() {
        for s in SUBNETS {
            let vpc = find_vpc(s.vpc).expect("subnet points at unknown vpc");
            assert_eq!(vpc.region, s.region);
        }
    }
}
