/// <https://www.w3.org/2018/credentials/v1>
pub const CREDENTIALS_V1: &str = include_str!("../w3c-2018-credentials-v1.jsonld");
/// <https://w3id.org/security/suites/ed25519-2018/v1>
pub const ED25519_2018_V1: &str = include_str!("../w3id-security-suites-ed25519-2018-v1.jsonld");
