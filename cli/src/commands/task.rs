use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use taskman_core::service::TaskmanService;
use taskman_core::view::TaskBoard;

use super::helpers::{DayRef, format_date, parse_date, parse_day_ref, today};

pub(crate) fn cmd_task_add(
    svc: &mut TaskmanService,
    title: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let today = today();
    let date = parse_date(date)?;
    let mut board = svc.load_tasks(today)?;

    let task = svc.add_task(&mut board, title, date, today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!(
            "Added task {} for {}: {}",
            task.id,
            format_date(task.date),
            task.title
        );
        print_task_board(&board);
    }

    Ok(())
}

pub(crate) fn cmd_task_done(
    svc: &TaskmanService,
    id: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let mut board = svc.load_tasks(date)?;

    svc.complete_task(&mut board, id, date)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "completed": id, "date": format_date(date) })
        );
    } else {
        println!("Completed task {id} for {}", format_date(date));
        print_task_board(&board);
    }

    Ok(())
}

pub(crate) fn cmd_task_list(svc: &TaskmanService, day: Option<String>, json: bool) -> Result<()> {
    let board = match parse_day_ref(day)? {
        DayRef::Date(date) => svc.load_tasks(date)?,
        DayRef::Offset(days) => {
            let mut board = svc.load_tasks(today())?;
            board.shift_days(svc.database(), days)?;
            board
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        print_task_board(&board);
    }

    Ok(())
}

fn print_task_board(board: &TaskBoard) {
    let date = format_date(board.date());
    if board.is_empty() {
        eprintln!("No tasks for {date}. Use `taskman task add` to create one.");
        return;
    }

    #[derive(Tabled)]
    struct TaskRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Task")]
        title: String,
    }

    let rows: Vec<TaskRow> = board
        .tasks()
        .iter()
        .map(|t| TaskRow {
            id: t.id,
            title: t.title.clone(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        .to_string();
    println!("Tasks for {date}");
    println!("{table}");
}
