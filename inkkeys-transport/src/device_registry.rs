//! USB identifiers of the keyboard's CDC serial interface

/// SparkFun vendor ID used by the Pro Micro based controller
pub const VENDOR_ID: u16 = 0x1B4F;

/// Product ID of the keyboard firmware
pub const PRODUCT_ID: u16 = 0x9206;

/// Check whether a USB VID/PID pair belongs to the keyboard
#[inline]
pub fn is_inkkeys(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && pid == PRODUCT_ID
}
