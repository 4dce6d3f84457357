use anyhow::{bail, Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::{debug, info};
use prettytable::{format, Cell, Row, Table};
use std::ops::Range;
use std::str::FromStr;

use conjoin::storage::{BidirectionalStorage, Combinator};
use conjoin::{BidirectionalCollection, Chain, Collection, Product, RandomAccessCollection};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print only the number of elements
    #[arg(long)]
    count: bool,

    /// Print only the element at this linear position
    #[arg(long)]
    at: Option<usize>,

    /// Maximum number of rows to print
    #[arg(long, default_value_t = 64)]
    limit: usize,

    /// Traverse from the last element backwards
    #[arg(long)]
    reverse: bool,

    #[command(subcommand)]
    combinator: CombinatorArg,
}

#[derive(clap::Subcommand)]
enum CombinatorArg {
    #[command(about = "Enumerate the Cartesian product of the lists")]
    Product {
        /// Comma-separated items (`a,b,c`) or an integer range (`lo..hi`)
        #[arg(required = true, num_args = 2..=4)]
        lists: Vec<List>,
    },
    #[command(about = "Concatenate the lists end to end")]
    Chain {
        /// Comma-separated items (`a,b,c`) or an integer range (`lo..hi`)
        #[arg(required = true, num_args = 2..=4)]
        lists: Vec<List>,
    },
}

/// A constituent given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum List {
    Items(Vec<String>),
    Span(Range<i64>),
}

impl FromStr for List {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some((lo, hi)) = s.split_once("..") {
            let lo: i64 = lo
                .trim()
                .parse()
                .with_context(|| format!("invalid range start in {s:?}"))?;
            let hi: i64 = hi
                .trim()
                .parse()
                .with_context(|| format!("invalid range end in {s:?}"))?;
            if hi < lo {
                bail!("range {s:?} ends before it starts");
            }
            return Ok(List::Span(lo..hi));
        }
        if s.is_empty() {
            return Ok(List::Items(vec![]));
        }
        Ok(List::Items(s.split(',').map(str::to_owned).collect()))
    }
}

impl Collection for List {
    type Element = String;
    type Index = usize;

    fn start_index(&self) -> usize {
        0
    }

    fn end_index(&self) -> usize {
        self.len()
    }

    fn index_after(&self, index: &usize) -> usize {
        assert!(*index < self.len(), "index {index} passes the end index");
        index + 1
    }

    fn element(&self, index: &usize) -> String {
        match self {
            List::Items(items) => items[*index].clone(),
            List::Span(span) => {
                let offset = i64::try_from(*index).expect("index should fit in i64");
                assert!(offset < span.end - span.start, "index {index} is out of range");
                (span.start + offset).to_string()
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            List::Items(items) => items.len(),
            List::Span(span) => span.start.abs_diff(span.end) as usize,
        }
    }

    fn index_offset_by(&self, index: &usize, offset: isize) -> usize {
        match index.checked_add_signed(offset) {
            Some(target) if target <= self.len() => target,
            _ => panic!("offset {offset} from {index} leaves 0..={}", self.len()),
        }
    }

    fn distance(&self, from: &usize, to: &usize) -> isize {
        *to as isize - *from as isize
    }
}

impl BidirectionalCollection for List {
    fn index_before(&self, index: &usize) -> usize {
        index
            .checked_sub(1)
            .unwrap_or_else(|| panic!("index {index} precedes the start index"))
    }
}

impl RandomAccessCollection for List {}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    match &args.combinator {
        CombinatorArg::Product { lists } => {
            debug!("Building product of {} lists", lists.len());
            match lists.as_slice() {
                [a, b] => report(&args, &Product::new((a.clone(), b.clone())), |(a, b)| {
                    vec![a, b]
                }),
                [a, b, c] => report(
                    &args,
                    &Product::new((a.clone(), b.clone(), c.clone())),
                    |(a, b, c)| vec![a, b, c],
                ),
                [a, b, c, d] => report(
                    &args,
                    &Product::new((a.clone(), b.clone(), c.clone(), d.clone())),
                    |(a, b, c, d)| vec![a, b, c, d],
                ),
                _ => bail!("expected 2 to 4 lists, got {}", lists.len()),
            }
        }
        CombinatorArg::Chain { lists } => {
            debug!("Building chain of {} lists", lists.len());
            match lists.as_slice() {
                [a, b] => report(&args, &Chain::new((a.clone(), b.clone())), |s| vec![s]),
                [a, b, c] => report(
                    &args,
                    &Chain::new((a.clone(), b.clone(), c.clone())),
                    |s| vec![s],
                ),
                [a, b, c, d] => report(
                    &args,
                    &Chain::new((a.clone(), b.clone(), c.clone(), d.clone())),
                    |s| vec![s],
                ),
                _ => bail!("expected 2 to 4 lists, got {}", lists.len()),
            }
        }
    }
}

fn report<S>(
    args: &Args,
    combinator: &Combinator<S>,
    columns: impl Fn(S::Element) -> Vec<String>,
) -> Result<()>
where
    S: BidirectionalStorage,
{
    let start_time = std::time::Instant::now();
    let len = combinator.len();
    info!("{} length {} took {:?}", S::NAME, len, start_time.elapsed());

    if args.count {
        println!("{len}");
        return Ok(());
    }

    if let Some(at) = args.at {
        let offset = isize::try_from(at).context("position does not fit in isize")?;
        let index = combinator.try_index_offset_by(&combinator.start_index(), offset)?;
        let element = combinator.try_get(&index)?;
        println!("{}", columns(element).iter().join(", "));
        return Ok(());
    }

    let elements: Box<dyn Iterator<Item = S::Element> + '_> = if args.reverse {
        Box::new(combinator.iter().rev())
    } else {
        Box::new(combinator.iter())
    };

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    for (i, element) in elements.take(args.limit).enumerate() {
        let linear = if args.reverse { len - 1 - i } else { i };
        let mut row = Row::new(vec![Cell::new(&linear.to_string())]);
        for column in columns(element) {
            row.add_cell(Cell::new(&column));
        }
        table.add_row(row);
    }
    table.printstd();
    if len > args.limit {
        println!("... {} more", len - args.limit);
    }
    Ok(())
}
