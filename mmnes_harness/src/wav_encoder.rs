use byteorder::{ByteOrder, LittleEndian};

pub const WAV_HEADER_SIZE: usize = 44;
const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

pub fn to_pcm(sample: f64) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16
}

/// Canonical 16-bit mono PCM WAV image of `samples`.
pub fn encode_wav(samples: &[f64], sample_rate: u32) -> Vec<u8> {
    let data_size = samples.len() * BYTES_PER_SAMPLE;
    let block_align = NUM_CHANNELS * BYTES_PER_SAMPLE as u16;
    let mut wav = vec![0u8; WAV_HEADER_SIZE + data_size];

    wav[0..4].copy_from_slice(b"RIFF");
    LittleEndian::write_u32(&mut wav[4..8], (36 + data_size) as u32);
    wav[8..12].copy_from_slice(b"WAVE");

    wav[12..16].copy_from_slice(b"fmt ");
    LittleEndian::write_u32(&mut wav[16..20], FMT_CHUNK_SIZE);
    LittleEndian::write_u16(&mut wav[20..22], PCM_FORMAT);
    LittleEndian::write_u16(&mut wav[22..24], NUM_CHANNELS);
    LittleEndian::write_u32(&mut wav[24..28], sample_rate);
    LittleEndian::write_u32(&mut wav[28..32], sample_rate * block_align as u32);
    LittleEndian::write_u16(&mut wav[32..34], block_align);
    LittleEndian::write_u16(&mut wav[34..36], BITS_PER_SAMPLE);

    wav[36..40].copy_from_slice(b"data");
    LittleEndian::write_u32(&mut wav[40..44], data_size as u32);

    let pcm: Vec<i16> = samples.iter().map(|s| to_pcm(*s)).collect();
    LittleEndian::write_i16_into(&pcm, &mut wav[WAV_HEADER_SIZE..]);

    wav
}
