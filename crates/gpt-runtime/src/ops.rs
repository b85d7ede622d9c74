//! Dense kernels over row-major `f32` slices.

/// Layer normalization with learned scale and shift.
pub fn layer_norm(x: &[f32], weight: &[f32], bias: &[f32], eps: f32) -> Vec<f32> {
    let n = x.len() as f32;
    let mean = x.iter().sum::<f32>() / n;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    let inv = 1.0 / (var + eps).sqrt();
    x.iter()
        .zip(weight.iter().zip(bias))
        .map(|(v, (w, b))| (v - mean) * inv * w + b)
        .collect()
}

/// GELU, tanh approximation.
pub fn gelu(x: f32) -> f32 {
    const SQRT_2_OVER_PI: f32 = 0.797_884_6;
    0.5 * x * (1.0 + (SQRT_2_OVER_PI * (x + 0.044_715 * x * x * x)).tanh())
}

/// `x @ W + b` where `W` is `[in_dim, out_dim]` row-major.
pub fn linear(x: &[f32], w: &[f32], b: &[f32], out_dim: usize) -> Vec<f32> {
    let mut out = b.to_vec();
    for (j, &xj) in x.iter().enumerate() {
        let row = &w[j * out_dim..(j + 1) * out_dim];
        for (o, &wij) in out.iter_mut().zip(row) {
            *o += xj * wij;
        }
    }
    out
}

/// Multi-head attention of a single query over `keys`/`values`
/// (`[seq_len, n_head * head_dim]` each).
pub fn attention(q: &[f32], keys: &[f32], values: &[f32], n_head: usize, head_dim: usize) -> Vec<f32> {
    let d = n_head * head_dim;
    let seq_len = keys.len() / d;
    let scale = 1.0 / (head_dim as f32).sqrt();
    let mut out = vec![0.0; d];

    for h in 0..n_head {
        let off = h * head_dim;
        let q_h = &q[off..off + head_dim];
        let mut scores: Vec<f32> = (0..seq_len)
            .map(|s| {
                let k = &keys[s * d + off..s * d + off + head_dim];
                q_h.iter().zip(k).map(|(a, b)| a * b).sum::<f32>() * scale
            })
            .collect();

        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for s in scores.iter_mut() {
            *s = (*s - max).exp();
            sum += *s;
        }

        for (pos, weight) in scores.iter().enumerate() {
            let v = &values[pos * d + off..pos * d + off + head_dim];
            for (o, &vi) in out[off..off + head_dim].iter_mut().zip(v) {
                *o += weight / sum * vi;
            }
        }
    }
    out
}
