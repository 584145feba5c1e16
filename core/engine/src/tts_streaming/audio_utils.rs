//! 内存 WAV 封装

/// 将 PCM 16-bit 小端音频封装为内存中的 WAV
///
/// # Arguments
/// * `pcm_data` - PCM 16-bit 音频数据（小端字节序）
/// * `sample_rate` - 采样率
/// * `channels` - 声道数
pub fn pcm_to_wav_bytes(pcm_data: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(44 + pcm_data.len());

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + pcm_data.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * channels as u32 * 2;
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&(channels * 2).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(pcm_data.len() as u32).to_le_bytes());
    out.extend_from_slice(pcm_data);
    out
}
