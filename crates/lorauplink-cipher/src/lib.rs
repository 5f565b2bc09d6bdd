//! FRMPayload encryption for LoRaWAN 1.0.x.
//!
//! The payload is XORed with a keystream made of AES-128 encrypted counter
//! blocks `A_i`. Encryption and decryption are the same operation.

pub mod error;
pub mod keystream;

pub use error::{CipherError, Result};
pub use keystream::{
    apply_keystream, counter_block, decrypt_downlink, decrypt_uplink, encrypt_downlink,
    encrypt_uplink, Direction, BLOCK_SIZE, KEY_SIZE,
};
