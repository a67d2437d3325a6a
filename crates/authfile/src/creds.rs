//! Credential bundle and fresh-credential initialization.
//!
//! The bundle holds the long-term identity material of a linked device.
//! Fields this crate does not model are kept in `extra` and written back
//! untouched, so a bundle produced by another client passes through intact.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::buffer_json::Bytes;
use crate::error::Result;
use crate::keys::{KeyPair, SignedKeyPair};

/// Registration ids are 14-bit.
const REGISTRATION_ID_MASK: u16 = 0x3fff;

/// Length of the ADV secret before base64 encoding.
const ADV_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
    #[serde(default)]
    pub unarchive_chats: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The account this device is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Persistent credentials of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationCreds {
    pub noise_key: KeyPair,
    pub pairing_ephemeral_key_pair: KeyPair,
    pub signed_identity_key: KeyPair,
    pub signed_pre_key: SignedKeyPair,
    pub registration_id: u32,
    pub adv_secret_key: String,
    #[serde(default)]
    pub processed_history_messages: Vec<Value>,
    pub next_pre_key_id: u32,
    pub first_unuploaded_pre_key_id: u32,
    #[serde(default)]
    pub account_sync_counter: u32,
    #[serde(default)]
    pub account_settings: AccountSettings,
    #[serde(default)]
    pub registered: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub me: Option<Contact>,
    /// Signed device identity, kept in its stored object form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_app_state_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prop_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_info: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_account_sync_timestamp: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credentials as found on disk.
///
/// A bundle missing fields this crate requires is still a valid bundle for
/// some other client; it is kept as a raw object and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    Typed(AuthenticationCreds),
    Raw(Map<String, Value>),
}

impl Credentials {
    pub fn as_typed(&self) -> Option<&AuthenticationCreds> {
        match self {
            Credentials::Typed(creds) => Some(creds),
            Credentials::Raw(_) => None,
        }
    }

    pub fn as_typed_mut(&mut self) -> Option<&mut AuthenticationCreds> {
        match self {
            Credentials::Typed(creds) => Some(creds),
            Credentials::Raw(_) => None,
        }
    }

    pub fn registration_id(&self) -> Option<u32> {
        match self {
            Credentials::Typed(creds) => Some(creds.registration_id),
            Credentials::Raw(obj) => obj
                .get("registrationId")
                .and_then(Value::as_u64)
                .and_then(|id| u32::try_from(id).ok()),
        }
    }

    pub fn registered(&self) -> bool {
        match self {
            Credentials::Typed(creds) => creds.registered,
            Credentials::Raw(obj) => obj.get("registered").and_then(Value::as_bool) == Some(true),
        }
    }

    /// `me.id` of the linked account, if paired.
    pub fn me_id(&self) -> Option<&str> {
        match self {
            Credentials::Typed(creds) => creds.me.as_ref().map(|me| me.id.as_str()),
            Credentials::Raw(obj) => obj.get("me")?.get("id")?.as_str(),
        }
    }
}

impl From<AuthenticationCreds> for Credentials {
    fn from(creds: AuthenticationCreds) -> Self {
        Credentials::Typed(creds)
    }
}

/// Generate a fresh credential bundle for a device that has never paired.
pub fn init_auth_creds() -> Result<AuthenticationCreds> {
    let identity_key = KeyPair::generate();
    let signed_pre_key = SignedKeyPair::generate(&identity_key, 1)?;

    let mut adv_secret = [0u8; ADV_SECRET_LEN];
    OsRng.fill_bytes(&mut adv_secret);

    Ok(AuthenticationCreds {
        noise_key: KeyPair::generate(),
        pairing_ephemeral_key_pair: KeyPair::generate(),
        signed_identity_key: identity_key,
        signed_pre_key,
        registration_id: generate_registration_id(),
        adv_secret_key: STANDARD.encode(adv_secret),
        processed_history_messages: Vec::new(),
        next_pre_key_id: 1,
        first_unuploaded_pre_key_id: 1,
        account_sync_counter: 0,
        account_settings: AccountSettings::default(),
        registered: false,
        me: None,
        account: None,
        platform: None,
        my_app_state_key_id: None,
        pairing_code: None,
        last_prop_hash: None,
        routing_info: None,
        last_account_sync_timestamp: None,
        extra: Map::new(),
    })
}

fn generate_registration_id() -> u32 {
    u32::from(OsRng.gen::<u16>() & REGISTRATION_ID_MASK)
}
