pub mod canvas;
pub mod commands;
pub mod error;
pub mod events;
pub mod input;
pub mod page;
pub mod resize;
pub mod selection;
pub mod tools;

pub use canvas::{Canvas, CanvasEffect, CursorIcon, Element, InteractionConfig, NodeChange};
pub use commands::{Command, CommandTarget, OrderedList, Transaction, UndoRedoManager, plan_move};
pub use error::EditorError;
pub use events::{Event, Subscription};
pub use input::{InputEvent, Key, Modifiers, PointerButton};
pub use page::{Page, PageCommand, PageList};
pub use resize::{ResizeLimits, ResizeOutcome, ResizeRequest, solve_resize};
pub use selection::{CanvasSelection, CardinalDirections, ResizeHandle};
pub use tools::{
    InteractionMachine, InteractionState, PressOutcome, RectangleSelectTool, RegionTool,
};
