/// Namespace of the escrow state record address.
pub const ESCROW_STATE_SEED: &[u8] = b"owner";

/// Namespace of the custody token account address.
pub const CUSTODY_SEED: &[u8] = b"token";

/// Units of the NFT mint locked by one escrow.
pub const NFT_AMOUNT: u64 = 1;
