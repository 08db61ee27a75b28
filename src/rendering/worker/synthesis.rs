use crate::rendering::common::texture_format::{calc_num_mips, calc_texture_size};
use crate::rendering::common::types::{GraphJob, OutputJob, RenderResult};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Digest of everything that influences an output: its uid and the values of all inputs.
pub fn job_digest(job: &GraphJob, output: &OutputJob) -> u64 {
    let mut hash = fnv1a(FNV_OFFSET, &output.uid.to_le_bytes());
    for input in &job.inputs {
        hash = fnv1a(hash, input.identifier.as_bytes());
        hash = fnv1a(hash, input.value.to_string().as_bytes());
        if let Some(image) = &input.image {
            hash = fnv1a(hash, &image.data);
        }
    }
    hash
}

/// Produces the pixels of one output. Identical inputs always produce identical pixels.
pub fn synthesize(job: &GraphJob, output: &OutputJob) -> RenderResult {
    let mipmap_count = match output.mipmaps {
        0 => calc_num_mips(output.width, output.height),
        count => count,
    };
    let size = calc_texture_size(output.width, output.height, mipmap_count, output.format);

    // xorshift64, the state must never be zero
    let mut state = job_digest(job, output) | 1;
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let bytes = state.to_le_bytes();
        let take = (size - data.len()).min(bytes.len());
        data.extend_from_slice(&bytes[..take]);
    }

    RenderResult {
        width: output.width,
        height: output.height,
        mipmap_count,
        format: output.format,
        data,
    }
}
