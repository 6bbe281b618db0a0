// Protocol constants for the Smart Exterior Kit hub

use std::time::Duration;

/// Size of every frame on the wire (20 bytes)
pub const FRAME_SIZE: usize = 20;

/// Size of the command payload inside a frame (16 bytes)
pub const PAYLOAD_SIZE: usize = 16;

/// Tag byte at offset 0 of every frame ('E')
pub const FRAME_MAGIC: u8 = 0x45;

/// Offset of the sequence byte
pub const SEQUENCE_OFFSET: usize = 1;

/// Offset of the command id byte
pub const COMMAND_OFFSET: usize = 2;

/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: usize = 3;

/// Offset of the checksum byte (last byte of the frame)
pub const CHECKSUM_OFFSET: usize = 19;

/// Cipher block size (two big-endian u32 words)
pub const CIPHER_BLOCK_SIZE: usize = 8;

/// Cipher key size (four big-endian u32 words)
pub const CIPHER_KEY_SIZE: usize = 16;

/// Round constant of the block cipher
pub const CIPHER_DELTA: u32 = 0x9E37_79B9;

/// Number of rounds per block
pub const CIPHER_ROUNDS: u32 = 32;

/// Vendor key shipped with the hub firmware
pub const DEFAULT_CIPHER_KEY: &[u8; CIPHER_KEY_SIZE] = b"adf78er3haf88ad0";

/// Factory password of the hub (case-sensitive)
pub const DEFAULT_PASSWORD: &str = "MONKEY";

/// Longest password the hub accepts
pub const MAX_PASSWORD_LEN: usize = 6;

/// How long the hub gets to acknowledge a password frame
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(6);

/// Number of hue/saturation presets the color mapper can produce
pub const COLOR_PRESET_COUNT: u8 = 48;

/// Highest index produced by the RGB mapper
pub const MAX_MAPPED_COLOR_INDEX: u8 = COLOR_PRESET_COUNT - 1;

/// Index of the named "white" slot, one past the hue/saturation grid
pub const WHITE_COLOR_INDEX: u8 = 48;

/// Highest brightness accepted by the hub (percent)
pub const MAX_BRIGHTNESS: u8 = 100;

/// GATT characteristic the host writes frames to
pub const WRITE_CHARACTERISTIC_UUID: &str = "8D96B001-0106-64C2-0001-9ACC4838521C";

/// GATT characteristic the hub pushes notifications on
pub const NOTIFY_CHARACTERISTIC_UUID: &str = "8D96B002-0106-64C2-0001-9ACC4838521C";

/// Advertised name prefix of the hub
pub const DEVICE_NAME_PREFIX: &str = "Smart Exterior Kit";
