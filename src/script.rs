//! Script assembly handling for the standard templates
//!
//! Scripts arrive both as raw hex and as whitespace-separated assembly
//! (`OP_DUP OP_HASH160 OP_PUSHBYTES_20 <hex> ...`). This module turns assembly
//! back into bytes, extracts pushed data elements and builds the handful of
//! scripts the miner synthesizes itself. Opcodes are looked up by name only;
//! nothing here executes a script.

use crate::encoding::{decode_hex, ByteEncoder};
use crate::error::{DecodeError, MinerError, Result, ScriptError};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// Look up an opcode byte by its assembly mnemonic
///
/// Accepts the fixed opcode names plus the numbered families
/// `OP_PUSHBYTES_1..75`, `OP_PUSHNUM_1..16` and `OP_RETURN_187..254`.
pub fn opcode_from_name(name: &str) -> Option<u8> {
    let byte = match name {
        "OP_0" | "OP_FALSE" | "OP_PUSHBYTES_0" => 0x00,
        "OP_PUSHDATA1" => OP_PUSHDATA1,
        "OP_PUSHDATA2" => OP_PUSHDATA2,
        "OP_PUSHDATA4" => OP_PUSHDATA4,
        "OP_PUSHNUM_NEG1" | "OP_1NEGATE" => 0x4f,
        "OP_RESERVED" => 0x50,
        "OP_TRUE" => 0x51,
        "OP_NOP" => 0x61,
        "OP_VER" => 0x62,
        "OP_IF" => 0x63,
        "OP_NOTIF" => 0x64,
        "OP_VERIF" => 0x65,
        "OP_VERNOTIF" => 0x66,
        "OP_ELSE" => 0x67,
        "OP_ENDIF" => 0x68,
        "OP_VERIFY" => 0x69,
        "OP_RETURN" => OP_RETURN,
        "OP_TOALTSTACK" => 0x6b,
        "OP_FROMALTSTACK" => 0x6c,
        "OP_2DROP" => 0x6d,
        "OP_2DUP" => 0x6e,
        "OP_3DUP" => 0x6f,
        "OP_2OVER" => 0x70,
        "OP_2ROT" => 0x71,
        "OP_2SWAP" => 0x72,
        "OP_IFDUP" => 0x73,
        "OP_DEPTH" => 0x74,
        "OP_DROP" => 0x75,
        "OP_DUP" => OP_DUP,
        "OP_NIP" => 0x77,
        "OP_OVER" => 0x78,
        "OP_PICK" => 0x79,
        "OP_ROLL" => 0x7a,
        "OP_ROT" => 0x7b,
        "OP_SWAP" => 0x7c,
        "OP_TUCK" => 0x7d,
        "OP_CAT" => 0x7e,
        "OP_SUBSTR" => 0x7f,
        "OP_LEFT" => 0x80,
        "OP_RIGHT" => 0x81,
        "OP_SIZE" => 0x82,
        "OP_INVERT" => 0x83,
        "OP_AND" => 0x84,
        "OP_OR" => 0x85,
        "OP_XOR" => 0x86,
        "OP_EQUAL" => OP_EQUAL,
        "OP_EQUALVERIFY" => OP_EQUALVERIFY,
        "OP_RESERVED1" => 0x89,
        "OP_RESERVED2" => 0x8a,
        "OP_1ADD" => 0x8b,
        "OP_1SUB" => 0x8c,
        "OP_2MUL" => 0x8d,
        "OP_2DIV" => 0x8e,
        "OP_NEGATE" => 0x8f,
        "OP_ABS" => 0x90,
        "OP_NOT" => 0x91,
        "OP_0NOTEQUAL" => 0x92,
        "OP_ADD" => 0x93,
        "OP_SUB" => 0x94,
        "OP_MUL" => 0x95,
        "OP_DIV" => 0x96,
        "OP_MOD" => 0x97,
        "OP_LSHIFT" => 0x98,
        "OP_RSHIFT" => 0x99,
        "OP_BOOLAND" => 0x9a,
        "OP_BOOLOR" => 0x9b,
        "OP_NUMEQUAL" => 0x9c,
        "OP_NUMEQUALVERIFY" => 0x9d,
        "OP_NUMNOTEQUAL" => 0x9e,
        "OP_LESSTHAN" => 0x9f,
        "OP_GREATERTHAN" => 0xa0,
        "OP_LESSTHANOREQUAL" => 0xa1,
        "OP_GREATERTHANOREQUAL" => 0xa2,
        "OP_MIN" => 0xa3,
        "OP_MAX" => 0xa4,
        "OP_WITHIN" => 0xa5,
        "OP_RIPEMD160" => 0xa6,
        "OP_SHA1" => 0xa7,
        "OP_SHA256" => 0xa8,
        "OP_HASH160" => OP_HASH160,
        "OP_HASH256" => 0xaa,
        "OP_CODESEPARATOR" => 0xab,
        "OP_CHECKSIG" => OP_CHECKSIG,
        "OP_CHECKSIGVERIFY" => 0xad,
        "OP_CHECKMULTISIG" => 0xae,
        "OP_CHECKMULTISIGVERIFY" => 0xaf,
        "OP_NOP1" => 0xb0,
        "OP_CLTV" | "OP_CHECKLOCKTIMEVERIFY" | "OP_NOP2" => 0xb1,
        "OP_CSV" | "OP_CHECKSEQUENCEVERIFY" | "OP_NOP3" => 0xb2,
        "OP_NOP4" => 0xb3,
        "OP_NOP5" => 0xb4,
        "OP_NOP6" => 0xb5,
        "OP_NOP7" => 0xb6,
        "OP_NOP8" => 0xb7,
        "OP_NOP9" => 0xb8,
        "OP_NOP10" => 0xb9,
        "OP_CHECKSIGADD" => 0xba,
        "OP_INVALIDOPCODE" => 0xff,
        _ => return numbered_opcode(name),
    };
    Some(byte)
}

fn numbered_opcode(name: &str) -> Option<u8> {
    if let Some(n) = name.strip_prefix("OP_PUSHBYTES_") {
        return n.parse::<u8>().ok().filter(|n| (1..=75).contains(n));
    }
    if let Some(n) = name.strip_prefix("OP_PUSHNUM_") {
        return n.parse::<u8>().ok().filter(|n| (1..=16).contains(n)).map(|n| 0x50 + n);
    }
    if let Some(n) = name.strip_prefix("OP_RETURN_") {
        return n.parse::<u8>().ok().filter(|n| (187..=254).contains(n));
    }
    // OP_1 .. OP_16
    name.strip_prefix("OP_")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=16).contains(n))
        .map(|n| 0x50 + n)
}

/// Decode tokenized assembly into script bytes
///
/// Mnemonics map through the opcode table; every other token is hex data
/// appended verbatim. The data token following OP_PUSHDATA1/2/4 gets its
/// length field reinstated since assembly omits it.
pub fn decode_asm(asm: &str) -> Result<Vec<u8>> {
    let mut enc = ByteEncoder::new();
    let mut tokens = asm.split_whitespace();

    while let Some(token) = tokens.next() {
        if !token.starts_with("OP_") {
            enc.put_bytes(&decode_hex(token)?);
            continue;
        }

        let opcode = opcode_from_name(token)
            .ok_or_else(|| DecodeError::UnknownOpcode(token.to_string()))?;
        enc.put(opcode);

        if matches!(opcode, OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4) {
            let data = decode_hex(tokens.next().unwrap_or_default())?;
            match opcode {
                OP_PUSHDATA1 => enc.put(data.len() as u8),
                OP_PUSHDATA2 => enc.put(data.len() as u16),
                _ => enc.put(data.len() as u32),
            };
            enc.put_bytes(&data);
        }
    }

    Ok(enc.into_bytes())
}

/// Data elements pushed by an assembly script, in order
pub fn push_data(asm: &str) -> Result<Vec<Vec<u8>>> {
    asm.split_whitespace()
        .filter(|token| !token.starts_with("OP_"))
        .map(|token| decode_hex(token).map_err(MinerError::from))
        .collect()
}

/// Reject scripts whose assembly form does not re-encode to their hex
pub fn check_asm_matches_hex(asm: &str, script_hex: &str) -> Result<()> {
    if decode_asm(asm)? != decode_hex(script_hex)? {
        return Err(ScriptError::AsmMismatch.into());
    }
    Ok(())
}

/// P2PKH-equivalent script code for a v0 witness pubkey-hash program
///
/// `0x00 0x14 <20 bytes>` becomes `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn p2wpkh_script_code(locking_script: &[u8]) -> Result<Vec<u8>> {
    match locking_script {
        [OP_0, 0x14, program @ ..] if program.len() == 20 => {
            let mut code = Vec::with_capacity(25);
            code.extend_from_slice(&[OP_DUP, OP_HASH160, 0x14]);
            code.extend_from_slice(program);
            code.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
            Ok(code)
        }
        _ => Err(ScriptError::MalformedWitnessProgram.into()),
    }
}

/// Minimal push of a script number (BIP34 coinbase height)
pub fn script_number_push(value: u32) -> Vec<u8> {
    if value == 0 {
        return vec![OP_0];
    }

    let mut bytes = Vec::with_capacity(5);
    let mut n = value;
    while n > 0 {
        bytes.push((n & 0xff) as u8);
        n >>= 8;
    }
    // keep the number positive
    if bytes.last().map_or(false, |b| b & 0x80 != 0) {
        bytes.push(0x00);
    }

    let mut push = Vec::with_capacity(bytes.len() + 1);
    push.push(bytes.len() as u8);
    push.extend(bytes);
    push
}

/// OP_RETURN script carrying a single data push
pub fn null_data_script(data: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(data.len() + 2);
    script.push(OP_RETURN);
    script.push(data.len() as u8);
    script.extend_from_slice(data);
    script
}
