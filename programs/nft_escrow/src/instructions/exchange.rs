use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{
    errors::EscrowError,
    events::EscrowExchanged,
    ledger::SplTokenLedger,
    protocol::{self, ExchangeKeys},
    state::EscrowState,
};

#[derive(Accounts)]
pub struct Exchange<'info> {
    /// The buyer paying the price
    #[account(mut)]
    pub buyer: Signer<'info>,

    /// The seller recorded in the escrow (receives payment and rent)
    #[account(mut)]
    pub seller: SystemAccount<'info>,

    pub nft_mint: Box<Account<'info, Mint>>,

    pub currency_mint: Box<Account<'info, Mint>>,

    /// CHECK: loaded in the handler; its address is re-derived from the stored fields
    #[account(mut)]
    pub escrow_state: UncheckedAccount<'info>,

    /// CHECK: must equal the custody address derived from the escrow record
    #[account(mut)]
    pub custody: UncheckedAccount<'info>,

    /// Buyer's account the price is paid from
    #[account(mut)]
    pub buyer_currency_account: Box<Account<'info, TokenAccount>>,

    /// Buyer's associated token account receiving the NFT
    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = nft_mint,
        associated_token::authority = buyer,
    )]
    pub buyer_nft_account: Box<Account<'info, TokenAccount>>,

    /// Seller's associated token account receiving the price
    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = currency_mint,
        associated_token::authority = seller,
    )]
    pub seller_currency_account: Box<Account<'info, TokenAccount>>,

    pub associated_token_program: Program<'info, AssociatedToken>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

impl<'info> Exchange<'info> {
    fn keys(&self) -> ExchangeKeys {
        ExchangeKeys {
            buyer: self.buyer.key(),
            seller: self.seller.key(),
            escrow_state: self.escrow_state.key(),
            custody: self.custody.key(),
            buyer_currency_account: self.buyer_currency_account.key(),
            buyer_nft_account: self.buyer_nft_account.key(),
            seller_currency_account: self.seller_currency_account.key(),
        }
    }

    fn ledger(&self) -> SplTokenLedger<'info> {
        SplTokenLedger::new(
            self.token_program.to_account_info(),
            vec![
                self.buyer.to_account_info(),
                self.seller.to_account_info(),
                self.escrow_state.to_account_info(),
                self.custody.to_account_info(),
                self.nft_mint.to_account_info(),
                self.currency_mint.to_account_info(),
                self.buyer_currency_account.to_account_info(),
                self.buyer_nft_account.to_account_info(),
                self.seller_currency_account.to_account_info(),
            ],
        )
    }

    /// Swap the price for the NFT, then close custody and the escrow record
    pub fn settle(&mut self) -> Result<EscrowState> {
        let state = EscrowState::load(&self.escrow_state.to_account_info())?
            .ok_or_else(|| error!(EscrowError::EscrowNotFound))?;

        let mut ledger = self.ledger();
        protocol::exchange(&mut ledger, Some(&state), &self.keys())?;

        EscrowState::close(
            self.escrow_state.to_account_info(),
            self.seller.to_account_info(),
        )?;
        Ok(state)
    }
}

/// Handler for the exchange instruction
pub fn handler(ctx: Context<Exchange>) -> Result<()> {
    let state = ctx.accounts.settle()?;

    msg!(
        "Escrow {} exchanged: {} paid {}",
        ctx.accounts.escrow_state.key(),
        ctx.accounts.buyer.key(),
        state.price
    );
    emit!(EscrowExchanged {
        escrow: ctx.accounts.escrow_state.key(),
        buyer: ctx.accounts.buyer.key(),
        seller: state.owner,
        nft_mint: state.nft_mint,
        price: state.price,
    });

    Ok(())
}
