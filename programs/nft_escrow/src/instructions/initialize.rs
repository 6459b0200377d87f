use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    constants::{CUSTODY_SEED, ESCROW_STATE_SEED},
    events::EscrowOpened,
    ledger::SplTokenLedger,
    pda::EscrowAddresses,
    protocol::{self, Listing},
    state::EscrowState,
};

#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The seller listing the NFT (pays for both new accounts)
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Mint of the NFT being listed
    #[account(mint::decimals = 0)]
    pub nft_mint: Account<'info, Mint>,

    /// Mint the price is paid in
    pub currency_mint: Account<'info, Mint>,

    /// Seller's token account currently holding the NFT
    #[account(mut)]
    pub owner_nft_account: Account<'info, TokenAccount>,

    /// Escrow record; an already-open one is reported as a duplicate
    #[account(
        init_if_needed,
        payer = owner,
        space = EscrowState::DISCRIMINATOR.len() + EscrowState::INIT_SPACE,
        seeds = [ESCROW_STATE_SEED, owner.key().as_ref(), nft_mint.key().as_ref()],
        bump,
    )]
    pub escrow_state: Account<'info, EscrowState>,

    /// Custody account holding the NFT, owned by the escrow record
    #[account(
        init_if_needed,
        payer = owner,
        seeds = [CUSTODY_SEED, owner.key().as_ref(), nft_mint.key().as_ref()],
        bump,
        token::mint = nft_mint,
        token::authority = escrow_state,
    )]
    pub custody: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

impl<'info> Initialize<'info> {
    fn ledger(&self) -> SplTokenLedger<'info> {
        SplTokenLedger::new(
            self.token_program.to_account_info(),
            vec![
                self.owner.to_account_info(),
                self.nft_mint.to_account_info(),
                self.owner_nft_account.to_account_info(),
                self.custody.to_account_info(),
            ],
        )
    }

    /// Move the NFT into custody and record the listing terms
    pub fn open_escrow(&mut self, price: u64) -> Result<()> {
        let addresses = EscrowAddresses::derive(&self.owner.key(), &self.nft_mint.key())?;
        addresses.verify(&self.escrow_state.key(), &self.custody.key())?;

        let listing = Listing {
            owner: self.owner.key(),
            nft_mint: self.nft_mint.key(),
            currency_mint: self.currency_mint.key(),
            price,
            nft_supply: self.nft_mint.supply,
        };
        let existing = (*self.escrow_state).clone();

        msg!("custody tokens before lock: {}", self.custody.amount);
        let mut ledger = self.ledger();
        let state = protocol::open(
            &mut ledger,
            &listing,
            Some(&existing),
            &addresses,
            &self.owner_nft_account.key(),
        )?;
        self.custody.reload()?;
        msg!("custody tokens after lock: {}", self.custody.amount);

        self.escrow_state.set_inner(state);
        Ok(())
    }
}

/// Handler for the initialize instruction
pub fn handler(ctx: Context<Initialize>, price: u64) -> Result<()> {
    ctx.accounts.open_escrow(price)?;

    let escrow = &ctx.accounts.escrow_state;
    msg!("Escrow {} opened at price {}", escrow.key(), escrow.price);
    emit!(EscrowOpened {
        escrow: escrow.key(),
        owner: escrow.owner,
        nft_mint: escrow.nft_mint,
        currency_mint: escrow.currency_mint,
        price: escrow.price,
    });

    Ok(())
}
