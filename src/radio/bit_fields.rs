use bitfield_struct::bitfield;

/// The CONFIG register image.
///
/// The three mask bits disable the matching event on the IRQ pin when set.
/// CRC is always on at 16 bits; the field defaults encode that.
#[bitfield(u8, order = Msb)]
pub(crate) struct Config {
    #[bits(1)]
    _padding: u8,

    #[bits(1, default = true)]
    pub mask_rx_dr: bool,

    #[bits(1, default = true)]
    pub mask_tx_ds: bool,

    #[bits(1, default = true)]
    pub mask_max_rt: bool,

    #[bits(1, default = true)]
    pub en_crc: bool,

    #[bits(1, default = true)]
    pub crc_16bit: bool,

    pub power: bool,

    pub prim_rx: bool,
}

/// The SETUP_RETR register image: auto-retransmit delay and count.
#[bitfield(u8, order = Msb)]
pub(crate) struct SetupRetry {
    /// Delay between attempts, in 250 us steps above 250 us.
    #[bits(4)]
    pub ard: u8,

    /// Attempt count before MAX_RT is raised.
    #[bits(4, default = 1)]
    pub arc: u8,
}
