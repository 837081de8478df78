use std::fs;
use std::path::Path;

/// Writes a silent 16-bit mono PCM wav of roughly `duration_ms`.
pub fn write_test_wav(path: &Path, duration_ms: u32) {
    let sample_rate: u32 = 44_100;
    let channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let bytes_per_sample = u32::from(bits_per_sample / 8);
    let total_samples = (u64::from(sample_rate) * u64::from(duration_ms) / 1_000) as u32;
    let data_size = total_samples * u32::from(channels) * bytes_per_sample;
    let byte_rate = sample_rate * u32::from(channels) * bytes_per_sample;
    let block_align = channels * (bits_per_sample / 8);
    let riff_chunk_size = 36_u32.saturating_add(data_size);

    let mut bytes = Vec::with_capacity((44_u32 + data_size) as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&riff_chunk_size.to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16_u32.to_le_bytes());
    bytes.extend_from_slice(&1_u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits_per_sample.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    bytes.resize((44_u32 + data_size) as usize, 0_u8);

    fs::write(path, bytes).expect("wav fixture should be written");
}
