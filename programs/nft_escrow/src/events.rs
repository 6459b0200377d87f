use anchor_lang::prelude::*;

#[event]
pub struct EscrowOpened {
    pub escrow: Pubkey,
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
    pub currency_mint: Pubkey,
    pub price: u64,
}

#[event]
pub struct EscrowExchanged {
    pub escrow: Pubkey,
    pub buyer: Pubkey,
    pub seller: Pubkey,
    pub nft_mint: Pubkey,
    pub price: u64,
}

#[event]
pub struct EscrowCancelled {
    pub escrow: Pubkey,
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
}
