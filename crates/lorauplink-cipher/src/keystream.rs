use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use lorauplink_frame::DevAddr;

use crate::error::{CipherError, Result};

/// AES block size and keystream block length.
pub const BLOCK_SIZE: usize = 16;

/// Session key length.
pub const KEY_SIZE: usize = 16;

const MAX_BLOCKS: usize = u8::MAX as usize;

/// Frame direction, encoded into every counter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Uplink,
    Downlink,
}

impl Direction {
    fn as_byte(self) -> u8 {
        match self {
            Direction::Uplink => 0x00,
            Direction::Downlink => 0x01,
        }
    }
}

/// Build counter block `A_i`.
///
/// ```text
/// ┌──────┬────────┬─────┬──────────────┬──────────────┬──────┬─────┐
/// │ 0x01 │ 4 x 00 │ Dir │ DevAddr (LE) │ FCntUp (LE)  │ 0x00 │ i   │
/// │ 1B   │ 4B     │ 1B  │ 4B           │ 4B           │ 1B   │ 1B  │
/// └──────┴────────┴─────┴──────────────┴──────────────┴──────┴─────┘
/// ```
pub fn counter_block(direction: Direction, dev_addr: DevAddr, fcnt: u32, index: u8) -> [u8; 16] {
    let mut block = [0u8; BLOCK_SIZE];
    block[0] = 0x01;
    block[5] = direction.as_byte();
    block[6..10].copy_from_slice(&dev_addr.to_wire());
    block[10..14].copy_from_slice(&fcnt.to_le_bytes());
    block[15] = index;
    block
}

/// XOR `data` in place with the keystream for the given session parameters.
pub fn apply_keystream(
    key: &[u8],
    direction: Direction,
    dev_addr: DevAddr,
    fcnt: u32,
    data: &mut [u8],
) -> Result<()> {
    let cipher = Aes128::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;

    let max = MAX_BLOCKS * BLOCK_SIZE;
    if data.len() > max {
        return Err(CipherError::PayloadTooLong {
            len: data.len(),
            max,
        });
    }

    for (chunk, index) in data.chunks_mut(BLOCK_SIZE).zip(1u8..=u8::MAX) {
        let mut block = counter_block(direction, dev_addr, fcnt, index);
        cipher.encrypt_block((&mut block).into());
        for (byte, key_byte) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= key_byte;
        }
    }

    Ok(())
}

/// Decrypt an uplink FRMPayload with the application session key.
pub fn decrypt_uplink(key: &[u8], dev_addr: DevAddr, fcnt: u32, payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = payload.to_vec();
    apply_keystream(key, Direction::Uplink, dev_addr, fcnt, &mut out)?;
    Ok(out)
}

/// Encrypt an uplink FRMPayload, as the end device does.
pub fn encrypt_uplink(key: &[u8], dev_addr: DevAddr, fcnt: u32, payload: &[u8]) -> Result<Vec<u8>> {
    decrypt_uplink(key, dev_addr, fcnt, payload)
}

pub fn decrypt_downlink(
    key: &[u8],
    dev_addr: DevAddr,
    fcnt: u32,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let mut out = payload.to_vec();
    apply_keystream(key, Direction::Downlink, dev_addr, fcnt, &mut out)?;
    Ok(out)
}

pub fn encrypt_downlink(
    key: &[u8],
    dev_addr: DevAddr,
    fcnt: u32,
    payload: &[u8],
) -> Result<Vec<u8>> {
    decrypt_downlink(key, dev_addr, fcnt, payload)
}
