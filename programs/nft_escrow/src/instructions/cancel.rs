use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    errors::EscrowError,
    events::EscrowCancelled,
    ledger::SplTokenLedger,
    protocol::{self, CancelKeys},
    state::EscrowState,
};

#[derive(Accounts)]
pub struct Cancel<'info> {
    /// The seller who opened the escrow
    #[account(mut)]
    pub owner: Signer<'info>,

    /// CHECK: loaded in the handler; its address is re-derived from the stored fields
    #[account(mut)]
    pub escrow_state: UncheckedAccount<'info>,

    /// CHECK: must equal the custody address derived from the escrow record
    #[account(mut)]
    pub custody: UncheckedAccount<'info>,

    pub nft_mint: Account<'info, Mint>,

    /// Seller's token account receiving the NFT back
    #[account(mut)]
    pub owner_nft_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

impl<'info> Cancel<'info> {
    fn keys(&self) -> CancelKeys {
        CancelKeys {
            owner: self.owner.key(),
            escrow_state: self.escrow_state.key(),
            custody: self.custody.key(),
            owner_nft_account: self.owner_nft_account.key(),
        }
    }

    fn ledger(&self) -> SplTokenLedger<'info> {
        SplTokenLedger::new(
            self.token_program.to_account_info(),
            vec![
                self.owner.to_account_info(),
                self.escrow_state.to_account_info(),
                self.custody.to_account_info(),
                self.nft_mint.to_account_info(),
                self.owner_nft_account.to_account_info(),
            ],
        )
    }

    /// Return the NFT to the seller, then close custody and the escrow record
    pub fn refund_and_close(&mut self) -> Result<EscrowState> {
        let state = EscrowState::load(&self.escrow_state.to_account_info())?
            .ok_or_else(|| error!(EscrowError::EscrowNotFound))?;

        let mut ledger = self.ledger();
        protocol::cancel(&mut ledger, Some(&state), &self.keys())?;

        EscrowState::close(
            self.escrow_state.to_account_info(),
            self.owner.to_account_info(),
        )?;
        Ok(state)
    }
}

/// Handler for the cancel instruction
pub fn handler(ctx: Context<Cancel>) -> Result<()> {
    let state = ctx.accounts.refund_and_close()?;

    msg!("Escrow {} cancelled", ctx.accounts.escrow_state.key());
    emit!(EscrowCancelled {
        escrow: ctx.accounts.escrow_state.key(),
        owner: state.owner,
        nft_mint: state.nft_mint,
    });

    Ok(())
}
