/// Strip the resource suffix from a jid: `alice@x/laptop` → `alice@x`.
///
/// A jid without a resource is returned unchanged.
pub fn bare_jid(jid: &str) -> &str {
    jid.split('/').next().unwrap_or(jid)
}
