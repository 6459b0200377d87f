use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    #[msg("Authorization failure: signer is not allowed to perform this action")]
    AuthorizationFailure,
    #[msg("Account mismatch: supplied account does not match the escrow record")]
    AccountMismatch,
    #[msg("Insufficient funds: buyer balance is below the asking price")]
    InsufficientFunds,
    #[msg("Invalid price: price must be greater than zero")]
    InvalidPrice,
    #[msg("Escrow not found: it was completed, cancelled or never opened")]
    EscrowNotFound,
    #[msg("Duplicate escrow: this owner already has an open escrow for this NFT")]
    DuplicateEscrow,
    #[msg("Derivation exhausted: no valid bump for the escrow address")]
    DerivationExhausted,
    #[msg("NFT not held: owner account holds no unit of the NFT")]
    NftNotHeld,
    #[msg("Not an NFT: mint supply must be exactly one")]
    NotNonFungible,
}
