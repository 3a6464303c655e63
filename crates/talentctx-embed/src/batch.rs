//! Batch plumbing around the encoder: device choice, padded `[B, T]` token
//! tensors, and sentence pooling of the `[B, T, H]` hidden states.
use anyhow::{anyhow, bail, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::info;

/// XLM-RoBERTa's `<pad>` id.
const PAD_ID: u32 = 1;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(dev) => {
            info!(device = "metal", "embedding device selected");
            return dev;
        }
        Err(e) => tracing::warn!(error = %e, "metal unavailable; falling back to CPU"),
    }
    info!(device = "cpu", "embedding device selected");
    Device::Cpu
}

/// Token ids and attention mask for a whole batch, each `[texts.len(), max_len]`.
/// Longer inputs are truncated; shorter ones are padded with a zero mask.
pub fn encode_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let mut ids = Vec::with_capacity(texts.len() * max_len);
    let mut mask = Vec::with_capacity(texts.len() * max_len);
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("tokenizing {} chars: {}", text.chars().count(), e))?;
        let kept = enc.get_ids().len().min(max_len);
        ids.extend_from_slice(&enc.get_ids()[..kept]);
        mask.extend_from_slice(&enc.get_attention_mask()[..kept]);
        ids.resize(ids.len() + max_len - kept, PAD_ID);
        mask.resize(mask.len() + max_len - kept, 0);
    }
    let shape = (texts.len(), max_len);
    Ok((Tensor::from_vec(ids, shape, device)?, Tensor::from_vec(mask, shape, device)?))
}

/// Mean over unmasked tokens, then L2 normalization: `[B, T, H] -> [B, H]`.
/// A row with no unmasked token pools to zeros.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, _hidden_dim) = hidden.dims3()?;
    if attention_mask.dims() != [batch, tokens] {
        bail!("attention mask {:?} does not fit hidden states [{batch}, {tokens}, _]", attention_mask.dims());
    }
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1f64)?;
    let mean = summed.broadcast_div(&counts)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-6f64)?;
    Ok(mean.broadcast_div(&norm)?)
}
