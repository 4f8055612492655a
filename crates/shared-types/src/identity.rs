//! # Organization Identity
//!
//! Acting identities, their channel/contract binding, and the private
//! collection naming convention.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shared collection holding the publicly readable asset records.
pub const MEMBER_ASSET_COLLECTION: &str = "assetCollection";

/// Suffix of every organization's implicit private collection.
pub const PRIVATE_COLLECTION_SUFFIX: &str = "PrivateCollection";

/// Default channel name.
pub const DEFAULT_CHANNEL: &str = "mychannel";

/// Default contract (chaincode) name.
pub const DEFAULT_CONTRACT: &str = "private";

/// Value of a boolean enrollment attribute that is set.
pub const ATTRIBUTE_TRUE: &str = "true";

/// Supply-chain role granted to a user at enrollment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Grows and registers assets.
    Farmer,
    /// Buys assets; may not create them.
    Retailer,
}

impl UserRole {
    /// Certificate attribute carrying the role.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Retailer => "retailer",
        }
    }
}

/// Membership service identifier naming an organization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MspId(String);

impl MspId {
    /// Create from a string such as `Org1MSP`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of this organization's private collection: `{MSPID}PrivateCollection`.
    pub fn private_collection(&self) -> String {
        format!("{}{}", self.0, PRIVATE_COLLECTION_SUFFIX)
    }
}

impl fmt::Display for MspId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the owning MSP from a private collection name.
pub fn collection_owner(collection: &str) -> Option<MspId> {
    collection
        .strip_suffix(PRIVATE_COLLECTION_SUFFIX)
        .filter(|msp| !msp.is_empty())
        .map(MspId::new)
}

/// An enrolled user acting on behalf of an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgIdentity {
    /// Organization of the user.
    pub msp_id: MspId,
    /// User identifier (certificate common name).
    pub user_id: String,
    /// Affiliation such as `org1.department1`.
    pub affiliation: String,
    /// Issuing certificate authority host, e.g. `ca.org1.example.com`.
    pub ca_host: String,
    /// Role attribute in the enrollment certificate.
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl OrgIdentity {
    /// Build an identity with the usual `orgN.department1` affiliation.
    pub fn new(msp_id: MspId, user_id: impl Into<String>, org_domain: &str) -> Self {
        Self {
            msp_id,
            user_id: user_id.into(),
            affiliation: format!("{org_domain}.department1"),
            ca_host: format!("ca.{org_domain}.example.com"),
            role: None,
        }
    }

    /// Enroll with `role`.
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Certificate attributes: `{farmer|retailer: "true"}` when a role is set.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.role
            .iter()
            .map(|role| (role.attribute().to_string(), ATTRIBUTE_TRUE.to_string()))
            .collect()
    }

    /// X.509 client id as the contract sees it:
    /// `x509::CN=<user>,OU=<org>+OU=client+OU=<dept>::CN=<ca>,O=<org domain>`.
    pub fn client_id(&self) -> String {
        let (org, dept) = self
            .affiliation
            .split_once('.')
            .unwrap_or((self.affiliation.as_str(), ""));
        let issuer_org = self.ca_host.strip_prefix("ca.").unwrap_or(&self.ca_host);
        format!(
            "x509::CN={},OU={}+OU=client+OU={}::CN={},O={},L=Durham,ST=North Carolina,C=US",
            self.user_id, org, dept, self.ca_host, issuer_org
        )
    }
}

/// An identity bound to a channel and contract: everything needed to open a
/// gateway connection for one organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    /// Acting identity.
    pub identity: OrgIdentity,
    /// Channel name.
    pub channel: String,
    /// Contract name.
    pub contract: String,
}

impl IdentityContext {
    /// Bind an identity to the default channel and contract.
    pub fn new(identity: OrgIdentity) -> Self {
        Self {
            identity,
            channel: DEFAULT_CHANNEL.to_string(),
            contract: DEFAULT_CONTRACT.to_string(),
        }
    }

    /// Organization of the acting identity.
    pub fn msp_id(&self) -> &MspId {
        &self.identity.msp_id
    }

    /// User identifier of the acting identity.
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    /// This organization's private collection.
    pub fn private_collection(&self) -> String {
        self.identity.msp_id.private_collection()
    }
}
