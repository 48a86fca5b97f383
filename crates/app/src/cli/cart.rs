use battant::cart::{CartLine, LineKey};
use battant_app::context::AppContext;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use crate::cli::render;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart lines and totals
    Show,

    /// Add an item, merging with an identical line
    Add(AddArgs),

    /// Add one unit to a line
    Increment(LineArgs),

    /// Take one unit off a line, keeping at least one
    Decrement(LineArgs),

    /// Remove a line
    Remove(LineArgs),

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
struct LineArgs {
    /// Product id
    #[arg(long)]
    id: String,

    /// Size
    #[arg(long)]
    size: Option<String>,

    /// Variant
    #[arg(long)]
    variant: Option<String>,
}

impl LineArgs {
    fn key(&self) -> LineKey {
        LineKey::new(
            self.id.as_str(),
            self.size.as_deref(),
            self.variant.as_deref(),
        )
    }
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(flatten)]
    line: LineArgs,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Unit price, discount applied
    #[arg(long)]
    price: Decimal,

    /// Unit price before the discount
    #[arg(long)]
    old_price: Option<Decimal>,

    /// Discount in percent points
    #[arg(long, default_value_t = Decimal::ZERO)]
    discount_percent: Decimal,

    /// Display name
    #[arg(long)]
    name: Option<String>,

    /// Image path
    #[arg(long)]
    image: Option<String>,
}

impl AddArgs {
    fn into_line(self) -> CartLine {
        let mut line = CartLine::new(self.line.key(), self.quantity, self.price);

        if let Some(old_price) = self.old_price {
            line = line.with_discount(old_price, self.discount_percent);
        }

        line.name = self.name;
        line.image = self.image;

        line
    }
}

pub(crate) fn run(context: &AppContext, command: CartCommand) -> Result<(), String> {
    let mut store = context.cart();

    if let Some(error) = store.error() {
        eprintln!("warning: {error}");
    }

    if let CartSubcommand::Increment(args)
    | CartSubcommand::Decrement(args)
    | CartSubcommand::Remove(args) = &command.command
        && store.cart().line(&args.key()).is_none()
    {
        return Err(format!("no cart line {}", args.key()));
    }

    let result = match command.command {
        CartSubcommand::Show => Ok(()),
        CartSubcommand::Add(args) => store.add_item(args.into_line()),
        CartSubcommand::Increment(args) => store.increment(&args.key()),
        CartSubcommand::Decrement(args) => store.decrement(&args.key()),
        CartSubcommand::Remove(args) => store.remove_item(&args.key()),
        CartSubcommand::Clear => store.clear(),
    };

    result.map_err(|error| format!("failed to update cart: {error}"))?;

    let summary = store
        .summary()
        .map_err(|error| format!("failed to price cart: {error}"))?;

    if store.lines().is_empty() {
        println!("cart is empty");
        return Ok(());
    }

    let table = render::cart(store.lines())
        .map_err(|error| format!("failed to price cart: {error}"))?;

    println!("{table}");
    println!("{}", render::summary(&summary));

    Ok(())
}
