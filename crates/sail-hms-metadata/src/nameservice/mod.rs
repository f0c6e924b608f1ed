//! HDFS HA nameservice resolution for storage locations
//!
//! Table and partition locations written by clients that talk to a specific
//! namenode embed its `host:port` authority. Once a failover promotes a
//! different namenode, those locations stop working. When the Hadoop
//! configuration declares HA nameservices, every namenode RPC address can be
//! mapped back to the logical nameservice, and locations are rewritten to
//! use that logical name instead.
//!
//! The mapping is built from three groups of keys:
//!
//! ```text
//! dfs.nameservices                      = ns1,ns2
//! dfs.ha.namenodes.ns1                  = nn1,nn2
//! dfs.namenode.rpc-address.ns1.nn1      = host-a.example.com:8020
//! dfs.namenode.rpc-address.ns1.nn2      = host-b.example.com:8020
//! ```
//!
//! which produces `hdfs://host-a.example.com:8020 -> hdfs://ns1` and
//! `hdfs://host-b.example.com:8020 -> hdfs://ns1`.

use arc_swap::ArcSwap;
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::HadoopConfSource;

/// Comma-separated list of nameservice ids
pub const NAMESERVICES_KEY: &str = "dfs.nameservices";

/// Prefix of the per-nameservice namenode id list key
pub const HA_NAMENODES_KEY_PREFIX: &str = "dfs.ha.namenodes";

/// Prefix of the per-namenode RPC address key
pub const NAMENODE_RPC_ADDRESS_KEY_PREFIX: &str = "dfs.namenode.rpc-address";

/// Scheme of locations that are eligible for rewriting
pub const HDFS_SCHEME: &str = "hdfs";

/// A `(scheme, host, port)` triple taken from a URI authority
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Endpoint {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into(),
            port,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Split `uri` into its endpoint and everything after the authority
    /// (path, query and fragment, verbatim).
    ///
    /// Returns `None` when the URI has no `scheme://authority` prefix or the
    /// authority cannot be read unambiguously (user info, empty host, a port
    /// that is not a valid `u16`).
    pub fn parse_uri(uri: &str) -> Option<(Self, &str)> {
        let (scheme, rest) = uri.split_once("://")?;
        if !is_valid_scheme(scheme) {
            return None;
        }

        let end = rest
            .find(|c| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        let (authority, remainder) = rest.split_at(end);
        if authority.contains('@') {
            return None;
        }

        let (host, port) = split_host_port(authority)?;
        Some((Self::new(scheme, host, port), remainder))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme, self.host, port),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Split an authority into host and optional port. Bracketed IPv6 hosts are
/// kept with their brackets.
fn split_host_port(authority: &str) -> Option<(&str, Option<u16>)> {
    let (host, port) = if authority.starts_with('[') {
        let close = authority.find(']')?;
        let (host, after) = authority.split_at(close + 1);
        match after {
            "" => (host, None),
            _ => (host, Some(after.strip_prefix(':')?)),
        }
    } else {
        match authority.rsplit_once(':') {
            Some((host, _)) if host.contains(':') => return None,
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return None;
    }

    match port {
        Some(port) => Some((host, Some(port.parse::<u16>().ok()?))),
        None => Some((host, None)),
    }
}

/// Immutable mapping from physical namenode endpoints to logical nameservice URIs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameserviceMapping {
    entries: HashMap<Endpoint, String>,
}

impl NameserviceMapping {
    /// A mapping that resolves nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Logical `scheme://nameservice` for an exact endpoint match
    pub fn resolve(&self, endpoint: &Endpoint) -> Option<&str> {
        self.entries.get(endpoint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Endpoint, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

/// Build the endpoint mapping from HA configuration.
///
/// Missing or malformed entries are skipped with a warning; this never fails.
pub fn build_mapping<C>(conf: &C) -> NameserviceMapping
where
    C: HadoopConfSource + ?Sized,
{
    let mut entries = HashMap::new();

    for ns in split_ids(conf.get(NAMESERVICES_KEY)) {
        let namenodes_key = format!("{}.{}", HA_NAMENODES_KEY_PREFIX, ns);
        let Some(namenodes) = conf.get(&namenodes_key) else {
            warn!("Nameservice {} has no {} entry, skipping", ns, namenodes_key);
            continue;
        };

        let logical = format!("{}://{}", HDFS_SCHEME, ns);
        for nn in split_ids(Some(namenodes)) {
            let address_key = format!("{}.{}.{}", NAMENODE_RPC_ADDRESS_KEY_PREFIX, ns, nn);
            let Some(address) = conf.get(&address_key) else {
                warn!("Namenode {}.{} has no {} entry, skipping", ns, nn, address_key);
                continue;
            };

            let Some((host, port)) = parse_rpc_address(address) else {
                warn!(
                    "Malformed RPC address {:?} for namenode {}.{}, skipping",
                    address, ns, nn
                );
                continue;
            };

            match entries.entry(Endpoint::new(HDFS_SCHEME, host, Some(port))) {
                Entry::Vacant(slot) => {
                    debug!("Mapping {} to {}", slot.key(), logical);
                    slot.insert(logical.clone());
                }
                Entry::Occupied(existing) => {
                    warn!(
                        "Endpoint {} is already mapped to {}, ignoring {}",
                        existing.key(),
                        existing.get(),
                        logical
                    );
                }
            }
        }
    }

    NameserviceMapping { entries }
}

fn split_ids(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn parse_rpc_address(address: &str) -> Option<(&str, u16)> {
    match split_host_port(address.trim())? {
        (host, Some(port)) => Some((host, port)),
        (_, None) => None,
    }
}

/// Rewrite `uri` to its logical nameservice form if its endpoint is mapped.
///
/// Only `hdfs` URIs with an explicit port are candidates; everything else,
/// including URIs whose authority cannot be parsed, is returned unchanged.
/// `label` names the owning object in log output.
pub fn rewrite_location<'a>(
    mapping: &NameserviceMapping,
    uri: &'a str,
    label: &str,
) -> Cow<'a, str> {
    if mapping.is_empty() {
        return Cow::Borrowed(uri);
    }

    let Some((endpoint, remainder)) = Endpoint::parse_uri(uri) else {
        return Cow::Borrowed(uri);
    };

    if endpoint.scheme() != HDFS_SCHEME {
        return Cow::Borrowed(uri);
    }

    // Never guess the port: a default could point at a different namenode.
    if endpoint.port().is_none() {
        debug!("Location {} for {} has no port, leaving as is", uri, label);
        return Cow::Borrowed(uri);
    }

    match mapping.resolve(&endpoint) {
        Some(logical) => {
            let rewritten = format!("{}{}", logical, remainder);
            debug!("Rewrote location for {}: {} -> {}", label, uri, rewritten);
            Cow::Owned(rewritten)
        }
        None => Cow::Borrowed(uri),
    }
}

/// Holds the current [`NameserviceMapping`] and swaps in rebuilt mappings
/// atomically when the Hadoop configuration changes.
#[derive(Debug, Default)]
pub struct NameserviceResolver {
    mapping: ArcSwap<NameserviceMapping>,
}

impl NameserviceResolver {
    pub fn new<C>(conf: &C) -> Self
    where
        C: HadoopConfSource + ?Sized,
    {
        Self {
            mapping: ArcSwap::from_pointee(build_mapping(conf)),
        }
    }

    /// Rebuild the mapping from `conf` and replace the current one
    pub fn reload<C>(&self, conf: &C)
    where
        C: HadoopConfSource + ?Sized,
    {
        let mapping = build_mapping(conf);
        info!("Loaded {} HA namenode endpoint mapping(s)", mapping.len());
        self.mapping.store(Arc::new(mapping));
    }

    /// Snapshot of the current mapping
    pub fn mapping(&self) -> Arc<NameserviceMapping> {
        self.mapping.load_full()
    }

    pub fn rewrite<'a>(&self, uri: &'a str, label: &str) -> Cow<'a, str> {
        let mapping = self.mapping.load();
        rewrite_location(&mapping, uri, label)
    }
}
