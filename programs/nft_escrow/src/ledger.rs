use anchor_lang::prelude::*;
use anchor_spl::token::{
    self, close_account, transfer_checked, CloseAccount, Mint, TokenAccount, TransferChecked,
};

use crate::{errors::EscrowError, pda::CustodyAuthority};

/// Who authorizes a movement out of a token account
#[derive(Clone, Copy, Debug)]
pub enum Authority<'a> {
    /// A wallet that signed the transaction
    Holder(&'a Pubkey),
    /// The escrow PDA, signing through the program
    Custody(&'a CustodyAuthority),
}

impl Authority<'_> {
    pub fn key(&self) -> Pubkey {
        match self {
            Authority::Holder(key) => **key,
            Authority::Custody(custody) => custody.address(),
        }
    }
}

/// What a token account holds and who may move it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Holding {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

/// The token operations the escrow relies on.
///
/// Implementations must reject any movement not authorized by the account's owner.
pub trait TokenLedger {
    fn holding(&self, account: &Pubkey) -> Result<Holding>;

    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
        authority: Authority<'_>,
    ) -> Result<()>;

    fn close_account(
        &mut self,
        account: &Pubkey,
        destination: &Pubkey,
        authority: Authority<'_>,
    ) -> Result<()>;
}

/// `TokenLedger` backed by SPL Token CPIs over the instruction's accounts
pub struct SplTokenLedger<'info> {
    token_program: AccountInfo<'info>,
    accounts: Vec<AccountInfo<'info>>,
}

impl<'info> SplTokenLedger<'info> {
    pub fn new(token_program: AccountInfo<'info>, accounts: Vec<AccountInfo<'info>>) -> Self {
        Self {
            token_program,
            accounts,
        }
    }

    fn account(&self, key: &Pubkey) -> Result<AccountInfo<'info>> {
        self.accounts
            .iter()
            .find(|info| info.key == key)
            .cloned()
            .ok_or_else(|| error!(EscrowError::AccountMismatch))
    }

    fn decimals(&self, mint: &Pubkey) -> Result<u8> {
        let info = self.account(mint)?;
        require_keys_eq!(*info.owner, token::ID, EscrowError::AccountMismatch);
        let mint = Mint::try_deserialize(&mut &info.try_borrow_data()?[..])?;
        Ok(mint.decimals)
    }
}

impl<'info> TokenLedger for SplTokenLedger<'info> {
    fn holding(&self, account: &Pubkey) -> Result<Holding> {
        let info = self.account(account)?;
        require_keys_eq!(*info.owner, token::ID, EscrowError::AccountMismatch);
        let state = TokenAccount::try_deserialize(&mut &info.try_borrow_data()?[..])?;

        Ok(Holding {
            mint: state.mint,
            owner: state.owner,
            amount: state.amount,
        })
    }

    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
        authority: Authority<'_>,
    ) -> Result<()> {
        let mint = self.holding(from)?.mint;
        let decimals = self.decimals(&mint)?;

        let cpi_accounts = TransferChecked {
            from: self.account(from)?,
            mint: self.account(&mint)?,
            to: self.account(to)?,
            authority: self.account(&authority.key())?,
        };

        let cpi_program = self.token_program.clone();
        match authority {
            Authority::Holder(_) => {
                let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);
                transfer_checked(cpi_ctx, amount, decimals)
            }
            Authority::Custody(custody) => {
                let seeds = custody.signer_seeds();
                let signer_seeds: &[&[&[u8]]] = &[&seeds];
                let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);
                transfer_checked(cpi_ctx, amount, decimals)
            }
        }
    }

    fn close_account(
        &mut self,
        account: &Pubkey,
        destination: &Pubkey,
        authority: Authority<'_>,
    ) -> Result<()> {
        let cpi_accounts = CloseAccount {
            account: self.account(account)?,
            destination: self.account(destination)?,
            authority: self.account(&authority.key())?,
        };

        let cpi_program = self.token_program.clone();
        match authority {
            Authority::Holder(_) => close_account(CpiContext::new(cpi_program, cpi_accounts)),
            Authority::Custody(custody) => {
                let seeds = custody.signer_seeds();
                let signer_seeds: &[&[&[u8]]] = &[&seeds];
                close_account(CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds))
            }
        }
    }
}
