//! Transaction codec: canonical serialization, parsing, identifiers, weight and fee

use crate::constants::*;
use crate::encoding::{decode_hash, decode_hex, display_hash, ByteDecoder, ByteEncoder};
use crate::error::{DecodeError, PoolError, Result};
use crate::hashing::hash256;
use crate::types::*;

impl Transaction {
    /// Serialize without witness data (legacy layout)
    ///
    /// version ‖ |vin| ‖ vin* ‖ |vout| ‖ vout* ‖ locktime
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut enc = ByteEncoder::with_capacity(self.estimated_size());
        enc.put(self.version);
        self.encode_inputs(&mut enc)?;
        self.encode_outputs(&mut enc)?;
        enc.put(self.locktime);
        Ok(enc.into_bytes())
    }

    /// Serialize including witness data
    ///
    /// Transactions without any witness element serialize exactly as `serialize`.
    /// Otherwise: version ‖ 0x00 ‖ 0x01 ‖ vin ‖ vout ‖ witness per input ‖ locktime
    pub fn serialize_with_witness(&self) -> Result<Vec<u8>> {
        if !self.has_witness() {
            return self.serialize();
        }

        let mut enc = ByteEncoder::with_capacity(self.estimated_size());
        enc.put(self.version).put(SEGWIT_MARKER).put(SEGWIT_FLAG);
        self.encode_inputs(&mut enc)?;
        self.encode_outputs(&mut enc)?;
        for input in &self.vin {
            enc.put_compact_size(input.witness.len() as u64);
            for item in &input.witness {
                enc.put_var_bytes(&decode_hex(item)?);
            }
        }
        enc.put(self.locktime);
        Ok(enc.into_bytes())
    }

    /// Serialize every output (value ‖ var script) back to back
    pub fn serialize_outputs(outputs: &[TxOut]) -> Result<Vec<u8>> {
        let mut enc = ByteEncoder::new();
        for output in outputs {
            encode_output(&mut enc, output)?;
        }
        Ok(enc.into_bytes())
    }

    /// Parse either serialization layout
    ///
    /// Prevout snapshots and assembly forms are not part of the wire format and
    /// come back empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Transaction> {
        let mut dec = ByteDecoder::new(bytes);
        let version = dec.read_i32()?;

        let mut segwit = false;
        let mut input_count = dec.read_compact_size()?;
        if input_count == SEGWIT_MARKER as u64 && dec.peek_u8() == Some(SEGWIT_FLAG) {
            dec.read_u8()?;
            segwit = true;
            input_count = dec.read_compact_size()?;
        }

        let mut vin = Vec::new();
        for _ in 0..input_count {
            let txid: [u8; 32] = dec.read_array()?;
            let vout = dec.read_u32()?;
            let scriptsig = hex::encode(dec.read_var_bytes()?);
            let sequence = dec.read_u32()?;
            vin.push(TxIn {
                txid: display_hash(&txid),
                vout,
                scriptsig,
                sequence,
                is_coinbase: txid == [0u8; 32] && vout == COINBASE_VOUT,
                ..TxIn::default()
            });
        }

        let output_count = dec.read_compact_size()?;
        let mut vout = Vec::new();
        for _ in 0..output_count {
            let value = dec.read_u64()?;
            let script = hex::encode(dec.read_var_bytes()?);
            vout.push(TxOut::new(value, script, ScriptType::Unknown));
        }

        if segwit {
            for input in vin.iter_mut() {
                let items = dec.read_compact_size()?;
                for _ in 0..items {
                    input.witness.push(hex::encode(dec.read_var_bytes()?));
                }
            }
        }

        let locktime = dec.read_u32()?;
        if !dec.is_empty() {
            return Err(DecodeError::TrailingBytes(dec.remaining()).into());
        }

        Ok(Transaction { version, locktime, vin, vout })
    }

    /// txid: double-SHA256 of the legacy serialization (internal byte order)
    pub fn txid(&self) -> Result<Hash> {
        Ok(hash256(&self.serialize()?))
    }

    /// wtxid: double-SHA256 of the witness serialization (internal byte order)
    pub fn wtxid(&self) -> Result<Hash> {
        Ok(hash256(&self.serialize_with_witness()?))
    }

    /// Weight = 3 × base size + total size
    pub fn weight(&self) -> Result<u64> {
        let base = self.serialize()?.len() as u64;
        let total = self.serialize_with_witness()?.len() as u64;
        Ok(base * (WITNESS_SCALE_FACTOR - 1) + total)
    }

    pub fn has_witness(&self) -> bool {
        self.vin.iter().any(|input| !input.witness.is_empty())
    }

    /// Single input spending the null outpoint at the maximum index
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].is_null_outpoint()
    }

    /// Σ prevout values (inputs without a snapshot count as zero)
    pub fn input_value(&self) -> Result<u64> {
        checked_total(
            self.vin
                .iter()
                .filter_map(|input| input.prevout.as_ref())
                .map(|prevout| prevout.value),
        )
    }

    pub fn output_value(&self) -> Result<u64> {
        checked_total(self.vout.iter().map(|output| output.value))
    }

    /// Fee = Σ inputs − Σ outputs; overspending is a pool rejection
    pub fn fee(&self) -> Result<u64> {
        let inputs = self.input_value()?;
        let outputs = self.output_value()?;
        inputs
            .checked_sub(outputs)
            .ok_or_else(|| PoolError::Overspend { inputs, outputs }.into())
    }

    fn encode_inputs(&self, enc: &mut ByteEncoder) -> Result<()> {
        enc.put_compact_size(self.vin.len() as u64);
        for input in &self.vin {
            enc.put_bytes(&input.outpoint()?.txid)
                .put(input.vout)
                .put_var_bytes(&decode_hex(&input.scriptsig)?)
                .put(input.sequence);
        }
        Ok(())
    }

    fn encode_outputs(&self, enc: &mut ByteEncoder) -> Result<()> {
        enc.put_compact_size(self.vout.len() as u64);
        for output in &self.vout {
            encode_output(enc, output)?;
        }
        Ok(())
    }

    fn estimated_size(&self) -> usize {
        10 + self.vin.len() * 148 + self.vout.len() * 34
    }
}

impl TxIn {
    /// Funding outpoint in internal byte order
    pub fn outpoint(&self) -> Result<OutPoint> {
        Ok(OutPoint {
            txid: decode_hash(&self.txid)?,
            vout: self.vout,
        })
    }

    pub fn is_null_outpoint(&self) -> bool {
        self.vout == COINBASE_VOUT && self.txid.bytes().all(|c| c == b'0')
    }
}

fn encode_output(enc: &mut ByteEncoder, output: &TxOut) -> Result<()> {
    enc.put(output.value)
        .put_var_bytes(&decode_hex(&output.scriptpubkey)?);
    Ok(())
}

/// Σ values, failing instead of wrapping past `u64::MAX`
fn checked_total(mut values: impl Iterator<Item = u64>) -> Result<u64> {
    values
        .try_fold(0u64, |total, value| total.checked_add(value))
        .ok_or_else(|| PoolError::ValueOverflow.into())
}
