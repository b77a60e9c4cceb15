use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean over unmasked tokens of `[B,T,H]` hidden states, L2-normalized to `[B,H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    ensure!(dims.len() == 3, "hidden shape must be [B,T,H], got {:?}", dims);
    let (batch, hidden_dim) = (dims[0], dims[2]);

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_broadcast = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let masked = (hidden * &mask_broadcast)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(sum.dtype())?;
    let mean = l2_normalize(&sum.broadcast_div(&lengths)?)?;
    ensure!(mean.dims() == &[batch, hidden_dim][..], "pooled shape {:?}", mean.dims());
    Ok(mean)
}

/// First-token (`[CLS]`) pooling, L2-normalized to `[B,H]`.
pub fn cls_l2(hidden: &Tensor) -> Result<Tensor> {
    ensure!(hidden.dims().len() == 3, "hidden shape must be [B,T,H], got {:?}", hidden.dims());
    let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
    l2_normalize(&cls)
}

fn l2_normalize(t: &Tensor) -> Result<Tensor> {
    let eps_val = match t.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], t.device())?.to_dtype(t.dtype())?.unsqueeze(0)?;
    let norm = t.sqr()?.sum_keepdim(1)?.sqrt()?.broadcast_add(&eps)?;
    Ok(t.broadcast_div(&norm)?)
}
