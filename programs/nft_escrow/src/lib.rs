use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod pda;
pub mod protocol;
pub mod state;

pub use instructions::*;

declare_id!("SCFgJXMztHKD3iPPtQpo4P8uGKRn9GWu1zhkeJ6fQTZ");

#[program]
pub mod nft_escrow {
    use super::*;

    /// List an NFT: the seller locks one unit in custody at a fixed price
    #[instruction(discriminator = 0)]
    pub fn initialize(ctx: Context<Initialize>, price: u64) -> Result<()> {
        instructions::initialize::handler(ctx, price)
    }

    /// Buy the listed NFT: the buyer pays the price and receives the NFT atomically
    #[instruction(discriminator = 1)]
    pub fn exchange(ctx: Context<Exchange>) -> Result<()> {
        instructions::exchange::handler(ctx)
    }

    /// Withdraw the listing: the seller takes the NFT back
    #[instruction(discriminator = 2)]
    pub fn cancel(ctx: Context<Cancel>) -> Result<()> {
        instructions::cancel::handler(ctx)
    }
}
