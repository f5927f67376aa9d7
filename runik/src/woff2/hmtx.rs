//! Reversing the WOFF2 `hmtx` transform.
//!
//! The transform drops left side bearings that equal each glyph's
//! `xMin`, which holds for most fonts. A flags byte records whether the
//! proportional part (the first `numberOfHMetrics` glyphs) and the
//! monospace tail were dropped; reconstruction reads what remains and
//! fills the gaps from the bounding boxes recovered during `glyf`
//! reconstruction.

use crate::{font_data::FontData, writer::Writer};

use super::Woff2Error;

const LSB_OMITTED: u8 = 0x01;
const TAIL_OMITTED: u8 = 0x02;

pub(super) fn reconstruct(
    data: &[u8],
    num_glyphs: u16,
    num_h_metrics: u16,
    x_mins: &[i16],
) -> Result<Vec<u8>, Woff2Error> {
    let num_glyphs = num_glyphs as usize;
    let num_h_metrics = num_h_metrics as usize;
    if num_h_metrics > num_glyphs || x_mins.len() < num_glyphs {
        return Err(Woff2Error::Reconstruction(
            "hmtx metric counts disagree with the glyph count",
        ));
    }
    let mut cursor = FontData::new(data).cursor();
    let flags = cursor.read::<u8>()?;
    if flags & !(LSB_OMITTED | TAIL_OMITTED) != 0 {
        return Err(Woff2Error::Reconstruction("reserved hmtx flags set"));
    }
    if flags == 0 {
        // A transform that drops nothing is required to not be used
        return Err(Woff2Error::Reconstruction(
            "hmtx transform with no omitted metrics",
        ));
    }

    let mut advances = Vec::with_capacity(num_h_metrics);
    for _ in 0..num_h_metrics {
        advances.push(cursor.read::<u16>()?);
    }
    let mut hmtx = Writer::with_capacity(num_h_metrics * 4 + (num_glyphs - num_h_metrics) * 2);
    for (index, advance) in advances.into_iter().enumerate() {
        let lsb = if flags & LSB_OMITTED != 0 {
            x_mins[index]
        } else {
            cursor.read::<i16>()?
        };
        hmtx.write(advance);
        hmtx.write(lsb);
    }
    for index in num_h_metrics..num_glyphs {
        let lsb = if flags & TAIL_OMITTED != 0 {
            x_mins[index]
        } else {
            cursor.read::<i16>()?
        };
        hmtx.write(lsb);
    }
    Ok(hmtx.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    #[test]
    fn derives_proportional_lsbs_from_x_mins() {
        let data = BeBuffer::new()
            .push(LSB_OMITTED)
            .push_all(&[500u16, 480])
            .push_all(&[7i16]) // explicit tail lsb
            .to_vec();
        let hmtx = reconstruct(&data, 3, 2, &[10, -20, 0]).unwrap();
        let expected = BeBuffer::new()
            .push(500u16)
            .push(10i16)
            .push(480u16)
            .push(-20i16)
            .push(7i16)
            .to_vec();
        assert_eq!(hmtx, expected);
    }

    #[test]
    fn derives_monospace_tail_from_x_mins() {
        let data = BeBuffer::new()
            .push(TAIL_OMITTED)
            .push(600u16)
            .push(12i16) // explicit proportional lsb
            .to_vec();
        let hmtx = reconstruct(&data, 3, 1, &[12, 30, 40]).unwrap();
        let expected = BeBuffer::new()
            .push(600u16)
            .push(12i16)
            .push(30i16)
            .push(40i16)
            .to_vec();
        assert_eq!(hmtx, expected);
    }

    #[test]
    fn derives_both_parts() {
        let data = BeBuffer::new()
            .push(LSB_OMITTED | TAIL_OMITTED)
            .push(600u16)
            .to_vec();
        let hmtx = reconstruct(&data, 2, 1, &[5, 6]).unwrap();
        let expected = BeBuffer::new()
            .push(600u16)
            .push(5i16)
            .push(6i16)
            .to_vec();
        assert_eq!(hmtx, expected);
    }

    #[test]
    fn rejects_pointless_transform() {
        let data = [0u8];
        assert!(matches!(
            reconstruct(&data, 1, 1, &[0]),
            Err(Woff2Error::Reconstruction(_))
        ));
    }

    #[test]
    fn rejects_reserved_flags() {
        let data = [0x05u8];
        assert!(matches!(
            reconstruct(&data, 1, 1, &[0]),
            Err(Woff2Error::Reconstruction(_))
        ));
    }

    #[test]
    fn rejects_metric_count_overflow() {
        let data = [LSB_OMITTED];
        assert!(matches!(
            reconstruct(&data, 1, 2, &[0]),
            Err(Woff2Error::Reconstruction(_))
        ));
    }
}
